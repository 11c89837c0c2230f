use thiserror::Error;

use crate::model::{
    AchievementError, MediaError, QuestionError, TestResultError, TopicError,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    TestResult(#[from] TestResultError),
    #[error(transparent)]
    Achievement(#[from] AchievementError),
}
