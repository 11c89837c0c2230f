use chrono::{DateTime, Utc};
use quiz_core::model::{Achievement, AchievementId, Unlock, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{map_achievement_row, ser};
use crate::repository::{AchievementStore, StorageError};

#[async_trait::async_trait]
impl AchievementStore for SqliteRepository {
    async fn list_achievements(&self) -> Result<Vec<Achievement>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, description, points, rule_code, rule_threshold
            FROM achievements
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut achievements = Vec::with_capacity(rows.len());
        for row in rows {
            achievements.push(map_achievement_row(&row)?);
        }
        Ok(achievements)
    }

    async fn list_unlocked(&self, user_id: UserId) -> Result<Vec<Unlock>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT achievement_id, unlocked_at
            FROM user_achievements
            WHERE user_id = ?1
            ORDER BY unlocked_at ASC, id ASC
            ",
        )
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut unlocks = Vec::with_capacity(rows.len());
        for row in rows {
            unlocks.push(Unlock {
                achievement_id: AchievementId::new(
                    row.try_get::<i64, _>("achievement_id").map_err(ser)?,
                ),
                unlocked_at: row.try_get("unlocked_at").map_err(ser)?,
            });
        }
        Ok(unlocks)
    }

    async fn unlock(
        &self,
        user_id: UserId,
        achievement_id: AchievementId,
        unlocked_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        // The UNIQUE (user_id, achievement_id) constraint makes repeat
        // unlocks keep the first record.
        sqlx::query(
            r"
            INSERT OR IGNORE INTO user_achievements (user_id, achievement_id, unlocked_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(user_id.value())
        .bind(achievement_id.value())
        .bind(unlocked_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn upsert_achievement(&self, achievement: &Achievement) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO achievements (id, name, description, points, rule_code, rule_threshold)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                points = excluded.points,
                rule_code = excluded.rule_code,
                rule_threshold = excluded.rule_threshold
            ",
        )
        .bind(achievement.id().value())
        .bind(achievement.name())
        .bind(achievement.description())
        .bind(i64::from(achievement.points()))
        .bind(achievement.rule().code())
        .bind(achievement.rule().threshold())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
