//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuestionKind, TestResultError};
use storage::repository::StorageError;

/// Errors emitted by the quiz engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("topic has no questions")]
    EmptyTopic,
    #[error("no active quiz session")]
    NoActiveSession,
    #[error("answer targets a question that is no longer current")]
    StaleQuestion,
    #[error("answer shape does not fit a {} question", .expected.as_str())]
    KindMismatch { expected: QuestionKind },
    #[error("option index {index} out of range for {options} options")]
    InvalidOption { index: usize, options: usize },
    #[error(transparent)]
    Result(#[from] TestResultError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
