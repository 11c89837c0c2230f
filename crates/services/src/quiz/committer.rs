//! Durable hand-off of a finished quiz.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use quiz_core::model::{Achievement, AchievementId, Period, TestResult, UserId};
use storage::repository::{AchievementStore, ResultStore, StorageError};
use tracing::warn;

/// Aggregate view of a user's results over one period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSummary {
    pub period: Period,
    pub tests: u32,
    /// Integer average of the per-test percentages; 0 with no tests.
    pub average_percentage: u8,
    pub best_percentage: u8,
    pub total_time: chrono::Duration,
}

/// What a commit attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub result_id: Option<i64>,
    pub new_achievements: Vec<Achievement>,
    /// False when the result row could not be written.
    pub saved: bool,
}

/// Persists test results and evaluates achievement unlocks.
#[derive(Clone)]
pub struct ResultCommitter {
    results: Arc<dyn ResultStore>,
    achievements: Arc<dyn AchievementStore>,
}

impl ResultCommitter {
    #[must_use]
    pub fn new(results: Arc<dyn ResultStore>, achievements: Arc<dyn AchievementStore>) -> Self {
        Self {
            results,
            achievements,
        }
    }

    /// Appends one result row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the write fails.
    pub async fn persist(&self, result: &TestResult) -> Result<i64, StorageError> {
        self.results.append_result(result).await
    }

    /// Unlocks every achievement whose rule the user's history newly meets
    /// and returns only those. Idempotent: an unchanged history unlocks
    /// nothing further.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when history or unlock reads/writes fail.
    pub async fn evaluate_achievements(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Achievement>, StorageError> {
        let history = self.results.list_results(user_id, None).await?;
        let unlocked: HashSet<AchievementId> = self
            .achievements
            .list_unlocked(user_id)
            .await?
            .into_iter()
            .map(|unlock| unlock.achievement_id)
            .collect();

        let mut newly = Vec::new();
        for achievement in self.achievements.list_achievements().await? {
            if unlocked.contains(&achievement.id()) {
                continue;
            }
            if achievement.rule().is_met(&history) {
                self.achievements
                    .unlock(user_id, achievement.id(), now)
                    .await?;
                newly.push(achievement);
            }
        }
        Ok(newly)
    }

    /// Summarizes the user's results over `period`, ending at `now`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the history read fails.
    pub async fn stats(
        &self,
        user_id: UserId,
        period: Period,
        now: DateTime<Utc>,
    ) -> Result<StatsSummary, StorageError> {
        let history = self
            .results
            .list_results(user_id, period.since(now))
            .await?;

        let tests = u32::try_from(history.len()).unwrap_or(u32::MAX);
        let average_percentage = if history.is_empty() {
            0
        } else {
            let sum: u64 = history.iter().map(|r| u64::from(r.percentage())).sum();
            u8::try_from(sum / history.len() as u64).unwrap_or(100)
        };
        let best_percentage = history
            .iter()
            .map(TestResult::percentage)
            .max()
            .unwrap_or(0);
        let total_time = history
            .iter()
            .fold(chrono::Duration::zero(), |acc, r| acc + r.time_spent());

        Ok(StatsSummary {
            period,
            tests,
            average_percentage,
            best_percentage,
            total_time,
        })
    }

    /// Persists `result` and evaluates unlocks, absorbing storage failures.
    ///
    /// A failed result write skips achievement evaluation (the history the
    /// rules would see is stale) and reports `saved == false`; the caller
    /// still gets the in-memory report.
    pub async fn commit(&self, result: &TestResult) -> CommitOutcome {
        let result_id = match self.persist(result).await {
            Ok(id) => id,
            Err(err) => {
                warn!(
                    user = result.user_id().value(),
                    error = %err,
                    "failed to persist test result"
                );
                return CommitOutcome {
                    result_id: None,
                    new_achievements: Vec::new(),
                    saved: false,
                };
            }
        };

        let new_achievements = match self
            .evaluate_achievements(result.user_id(), result.completed_at())
            .await
        {
            Ok(achievements) => achievements,
            Err(err) => {
                warn!(
                    user = result.user_id().value(),
                    error = %err,
                    "achievement evaluation failed"
                );
                Vec::new()
            }
        };

        CommitOutcome {
            result_id: Some(result_id),
            new_achievements,
            saved: true,
        }
    }
}
