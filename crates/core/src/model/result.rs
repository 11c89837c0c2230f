use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::ids::{TopicId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestResultError {
    #[error("max score must be > 0")]
    ZeroMaxScore,

    #[error("score ({score}) exceeds max score ({max_score})")]
    ScoreOutOfRange { score: u32, max_score: u32 },

    #[error("time spent cannot be negative")]
    NegativeTimeSpent,
}

//
// ─── TEST RESULT ───────────────────────────────────────────────────────────────
//

/// One completed quiz, as persisted in the durable store.
///
/// Append-only: a row per completed session, never updated. Active sessions
/// live in memory only; this is the whole history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    user_id: UserId,
    topic_id: TopicId,
    score: u32,
    max_score: u32,
    percentage: u8,
    time_spent: Duration,
    completed_at: DateTime<Utc>,
}

impl TestResult {
    /// Builds a validated result row.
    ///
    /// # Errors
    ///
    /// Returns `TestResultError` when the score exceeds the maximum, the
    /// maximum is zero, or the elapsed time is negative.
    pub fn from_parts(
        user_id: UserId,
        topic_id: TopicId,
        score: u32,
        max_score: u32,
        percentage: u8,
        time_spent: Duration,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, TestResultError> {
        if max_score == 0 {
            return Err(TestResultError::ZeroMaxScore);
        }
        if score > max_score {
            return Err(TestResultError::ScoreOutOfRange { score, max_score });
        }
        if time_spent < Duration::zero() {
            return Err(TestResultError::NegativeTimeSpent);
        }

        Ok(Self {
            user_id,
            topic_id,
            score,
            max_score,
            percentage,
            time_spent,
            completed_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    #[must_use]
    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    #[must_use]
    pub fn time_spent(&self) -> Duration {
        self.time_spent
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

//
// ─── HISTORY PERIOD ────────────────────────────────────────────────────────────
//

/// History window for result listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    Week,
    Month,
    Year,
    #[default]
    All,
}

impl Period {
    /// Lower bound for `completed_at`, or `None` for the full history.
    #[must_use]
    pub fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Period::Week => Some(now - Duration::weeks(1)),
            Period::Month => Some(now - Duration::days(30)),
            Period::Year => Some(now - Duration::days(365)),
            Period::All => None,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
