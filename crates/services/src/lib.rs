#![forbid(unsafe_code)]

pub mod error;
pub mod quiz;
pub mod store;

pub use quiz_core::Clock;

pub use error::QuizError;
pub use quiz::{
    AnswerDraft, AnswerOutcome, CommitOutcome, QuestionPrompt, QuizEngine, QuizProgress,
    QuizReport, QuizSession, ResultCommitter, StatsSummary, StepOutcome,
};
pub use store::SessionStore;
