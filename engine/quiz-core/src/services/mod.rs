pub mod countdown;
pub mod question_bank;
pub mod quiz_service;
pub mod quiz_session;

pub use question_bank::QuestionBank;
pub use quiz_service::QuizService;
pub use quiz_session::{Navigation, QuizSession};
