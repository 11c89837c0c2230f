use chrono::{DateTime, Utc};
use quiz_core::model::{TestResult, UserId};

use super::SqliteRepository;
use super::mapping::map_result_row;
use crate::repository::{ResultStore, StorageError};

#[async_trait::async_trait]
impl ResultStore for SqliteRepository {
    async fn append_result(&self, result: &TestResult) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO test_results
                (user_id, topic_id, score, max_score, percentage, time_spent_seconds, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(result.user_id().value())
        .bind(result.topic_id().value())
        .bind(i64::from(result.score()))
        .bind(i64::from(result.max_score()))
        .bind(i64::from(result.percentage()))
        .bind(result.time_spent().num_seconds())
        .bind(result.completed_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn list_results(
        &self,
        user_id: UserId,
        completed_from: Option<DateTime<Utc>>,
    ) -> Result<Vec<TestResult>, StorageError> {
        // A fixed lower bound keeps the query shape identical with and
        // without a period filter.
        let from = completed_from.unwrap_or(DateTime::<Utc>::MIN_UTC);

        let rows = sqlx::query(
            r"
            SELECT user_id, topic_id, score, max_score, percentage, time_spent_seconds, completed_at
            FROM test_results
            WHERE user_id = ?1 AND completed_at >= ?2
            ORDER BY completed_at DESC, id DESC
            ",
        )
        .bind(user_id.value())
        .bind(from)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(map_result_row(&row)?);
        }
        Ok(results)
    }
}
