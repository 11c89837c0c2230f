use quiz_core::model::{Question, Topic, TopicId};

use super::SqliteRepository;
use super::mapping::{map_question_row, map_topic_row};
use crate::repository::{QuestionBank, QuestionRecord, StorageError};

#[async_trait::async_trait]
impl QuestionBank for SqliteRepository {
    async fn list_topics(&self) -> Result<Vec<Topic>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, description
            FROM topics
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut topics = Vec::with_capacity(rows.len());
        for row in rows {
            topics.push(map_topic_row(&row)?);
        }
        Ok(topics)
    }

    async fn list_questions(&self, topic_id: TopicId) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, topic_id, text, kind, options, answer_key, media
            FROM questions
            WHERE topic_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(topic_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut questions = Vec::with_capacity(rows.len());
        for row in rows {
            questions.push(map_question_row(&row)?);
        }
        Ok(questions)
    }

    async fn upsert_topic(&self, topic: &Topic) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO topics (id, name, description)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description
            ",
        )
        .bind(topic.id().value())
        .bind(topic.name())
        .bind(topic.description())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let record = QuestionRecord::from_question(question)?;

        sqlx::query(
            r"
            INSERT INTO questions (id, topic_id, text, kind, options, answer_key, media)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                topic_id = excluded.topic_id,
                text = excluded.text,
                kind = excluded.kind,
                options = excluded.options,
                answer_key = excluded.answer_key,
                media = excluded.media
            ",
        )
        .bind(record.id.value())
        .bind(record.topic_id.value())
        .bind(record.text)
        .bind(record.kind)
        .bind(record.options_json)
        .bind(record.answer_key_json)
        .bind(record.media)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
