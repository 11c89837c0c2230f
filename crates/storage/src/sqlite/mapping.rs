use quiz_core::model::{
    Achievement, AchievementId, AchievementRule, Question, QuestionId, TestResult, Topic, TopicId,
    UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{QuestionRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn map_topic_row(row: &SqliteRow) -> Result<Topic, StorageError> {
    Topic::new(
        TopicId::new(row.try_get::<i64, _>("id").map_err(ser)?),
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let record = QuestionRecord {
        id: QuestionId::new(row.try_get::<i64, _>("id").map_err(ser)?),
        topic_id: TopicId::new(row.try_get::<i64, _>("topic_id").map_err(ser)?),
        text: row.try_get("text").map_err(ser)?,
        kind: row.try_get("kind").map_err(ser)?,
        options_json: row.try_get("options").map_err(ser)?,
        answer_key_json: row.try_get("answer_key").map_err(ser)?,
        media: row.try_get("media").map_err(ser)?,
    };
    record.into_question()
}

pub(crate) fn map_result_row(row: &SqliteRow) -> Result<TestResult, StorageError> {
    let score_i64: i64 = row.try_get("score").map_err(ser)?;
    let max_score_i64: i64 = row.try_get("max_score").map_err(ser)?;
    let percentage_i64: i64 = row.try_get("percentage").map_err(ser)?;
    let time_spent_seconds: i64 = row.try_get("time_spent_seconds").map_err(ser)?;

    TestResult::from_parts(
        UserId::new(row.try_get::<i64, _>("user_id").map_err(ser)?),
        TopicId::new(row.try_get::<i64, _>("topic_id").map_err(ser)?),
        u32::try_from(score_i64)
            .map_err(|_| StorageError::Serialization(format!("invalid score: {score_i64}")))?,
        u32::try_from(max_score_i64).map_err(|_| {
            StorageError::Serialization(format!("invalid max_score: {max_score_i64}"))
        })?,
        u8::try_from(percentage_i64).map_err(|_| {
            StorageError::Serialization(format!("invalid percentage: {percentage_i64}"))
        })?,
        chrono::Duration::seconds(time_spent_seconds),
        row.try_get("completed_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_achievement_row(row: &SqliteRow) -> Result<Achievement, StorageError> {
    let rule_code: String = row.try_get("rule_code").map_err(ser)?;
    let rule_threshold: Option<i64> = row.try_get("rule_threshold").map_err(ser)?;
    let rule = AchievementRule::from_code(&rule_code, rule_threshold).map_err(ser)?;

    let points_i64: i64 = row.try_get("points").map_err(ser)?;
    let points = u32::try_from(points_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid points: {points_i64}")))?;

    Achievement::new(
        AchievementId::new(row.try_get::<i64, _>("id").map_err(ser)?),
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<String, _>("description").map_err(ser)?,
        points,
        rule,
    )
    .map_err(ser)
}
