use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{
    Achievement, AchievementId, AnswerKey, Question, QuestionError, QuestionId, QuestionKind,
    MediaUri, TestResult, Topic, TopicId, Unlock, UserId,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── QUESTION RECORD ───────────────────────────────────────────────────────────
//

/// Persisted shape for a question.
///
/// Options and the answer key travel as JSON text so repositories can
/// serialize without leaking storage concerns into the domain layer. The
/// key payload depends on the kind: a bare index for `single`, an index
/// array for `multiple` and `sequence`.
#[derive(Debug, Clone)]
pub struct QuestionRecord {
    pub id: QuestionId,
    pub topic_id: TopicId,
    pub text: String,
    pub kind: String,
    pub options_json: String,
    pub answer_key_json: String,
    pub media: Option<String>,
}

impl QuestionRecord {
    /// Serialize a domain question for storage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if JSON encoding fails.
    pub fn from_question(question: &Question) -> Result<Self, StorageError> {
        let options_json = serde_json::to_string(question.options())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let key_value = match question.key() {
            AnswerKey::Choice(index) => serde_json::json!(index),
            AnswerKey::Selection(set) => serde_json::json!(set.iter().collect::<Vec<_>>()),
            AnswerKey::Ordering(order) => serde_json::json!(order),
        };
        let answer_key_json = serde_json::to_string(&key_value)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        Ok(Self {
            id: question.id(),
            topic_id: question.topic_id(),
            text: question.text().to_owned(),
            kind: question.kind().as_str().to_owned(),
            options_json,
            answer_key_json,
            media: question.media().map(ToString::to_string),
        })
    }

    /// Convert the record back into a domain `Question`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the JSON columns do not
    /// decode or domain validation rejects the decoded values.
    pub fn into_question(self) -> Result<Question, StorageError> {
        let ser = |e: &dyn std::fmt::Display| StorageError::Serialization(e.to_string());

        let kind = QuestionKind::from_str_codec(&self.kind).map_err(|e| ser(&e))?;
        let options: Vec<String> =
            serde_json::from_str(&self.options_json).map_err(|e| ser(&e))?;

        let key = match kind {
            QuestionKind::Single => {
                let index: usize =
                    serde_json::from_str(&self.answer_key_json).map_err(|e| ser(&e))?;
                AnswerKey::Choice(index)
            }
            QuestionKind::Multiple => {
                let indices: BTreeSet<usize> =
                    serde_json::from_str(&self.answer_key_json).map_err(|e| ser(&e))?;
                AnswerKey::Selection(indices)
            }
            QuestionKind::Sequence => {
                let order: Vec<usize> =
                    serde_json::from_str(&self.answer_key_json).map_err(|e| ser(&e))?;
                AnswerKey::Ordering(order)
            }
        };

        let media = self
            .media
            .map(MediaUri::parse)
            .transpose()
            .map_err(|e| ser(&e))?;

        Question::new(self.id, self.topic_id, self.text, options, key, media)
            .map_err(|e: QuestionError| ser(&e))
    }
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

/// Read path for topics and their questions.
///
/// The order `list_questions` returns is the quiz order; the engine treats
/// it as fixed once fetched. The write half exists for admin tooling,
/// seeding, and tests.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// List every topic.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store is unreachable.
    async fn list_topics(&self) -> Result<Vec<Topic>, StorageError>;

    /// List all questions for a topic, in quiz order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store is unreachable.
    async fn list_questions(&self, topic_id: TopicId) -> Result<Vec<Question>, StorageError>;

    /// Persist or update a topic.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the topic cannot be stored.
    async fn upsert_topic(&self, topic: &Topic) -> Result<(), StorageError>;

    /// Persist or update a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;
}

/// Append-only store of completed test results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Append one result row, returning its storage id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be written.
    async fn append_result(&self, result: &TestResult) -> Result<i64, StorageError>;

    /// List a user's results, newest first, optionally bounded below by
    /// completion time.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store is unreachable.
    async fn list_results(
        &self,
        user_id: UserId,
        completed_from: Option<DateTime<Utc>>,
    ) -> Result<Vec<TestResult>, StorageError>;
}

/// Achievement catalog plus per-user unlock records.
#[async_trait]
pub trait AchievementStore: Send + Sync {
    /// List the full achievement catalog.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store is unreachable.
    async fn list_achievements(&self) -> Result<Vec<Achievement>, StorageError>;

    /// List a user's unlocked achievements.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store is unreachable.
    async fn list_unlocked(&self, user_id: UserId) -> Result<Vec<Unlock>, StorageError>;

    /// Record an unlock. Idempotent: unlocking twice keeps the first record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be written.
    async fn unlock(
        &self,
        user_id: UserId,
        achievement_id: AchievementId,
        unlocked_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Persist or update an achievement definition (admin/seed path).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the definition cannot be stored.
    async fn upsert_achievement(&self, achievement: &Achievement) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY IMPLEMENTATION ──────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    topics: Arc<Mutex<HashMap<TopicId, Topic>>>,
    questions: Arc<Mutex<HashMap<TopicId, Vec<Question>>>>,
    results: Arc<Mutex<Vec<TestResult>>>,
    achievements: Arc<Mutex<HashMap<AchievementId, Achievement>>>,
    unlocks: Arc<Mutex<HashMap<UserId, Vec<Unlock>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<'a, T>(m: &'a Mutex<T>) -> Result<std::sync::MutexGuard<'a, T>, StorageError> {
        m.lock().map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl QuestionBank for InMemoryRepository {
    async fn list_topics(&self) -> Result<Vec<Topic>, StorageError> {
        let guard = Self::lock(&self.topics)?;
        let mut topics: Vec<Topic> = guard.values().cloned().collect();
        topics.sort_by_key(Topic::id);
        Ok(topics)
    }

    async fn list_questions(&self, topic_id: TopicId) -> Result<Vec<Question>, StorageError> {
        let guard = Self::lock(&self.questions)?;
        Ok(guard.get(&topic_id).cloned().unwrap_or_default())
    }

    async fn upsert_topic(&self, topic: &Topic) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.topics)?;
        guard.insert(topic.id(), topic.clone());
        Ok(())
    }

    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.questions)?;
        let questions = guard.entry(question.topic_id()).or_default();
        match questions.iter_mut().find(|q| q.id() == question.id()) {
            Some(existing) => *existing = question.clone(),
            None => questions.push(question.clone()),
        }
        Ok(())
    }
}

#[async_trait]
impl ResultStore for InMemoryRepository {
    async fn append_result(&self, result: &TestResult) -> Result<i64, StorageError> {
        let mut guard = Self::lock(&self.results)?;
        guard.push(result.clone());
        i64::try_from(guard.len()).map_err(|_| StorageError::Serialization("row overflow".into()))
    }

    async fn list_results(
        &self,
        user_id: UserId,
        completed_from: Option<DateTime<Utc>>,
    ) -> Result<Vec<TestResult>, StorageError> {
        let guard = Self::lock(&self.results)?;
        let mut results: Vec<TestResult> = guard
            .iter()
            .filter(|r| r.user_id() == user_id)
            .filter(|r| completed_from.is_none_or(|from| r.completed_at() >= from))
            .cloned()
            .collect();
        results.sort_by_key(|r| std::cmp::Reverse(r.completed_at()));
        Ok(results)
    }
}

#[async_trait]
impl AchievementStore for InMemoryRepository {
    async fn list_achievements(&self) -> Result<Vec<Achievement>, StorageError> {
        let guard = Self::lock(&self.achievements)?;
        let mut achievements: Vec<Achievement> = guard.values().cloned().collect();
        achievements.sort_by_key(Achievement::id);
        Ok(achievements)
    }

    async fn list_unlocked(&self, user_id: UserId) -> Result<Vec<Unlock>, StorageError> {
        let guard = Self::lock(&self.unlocks)?;
        Ok(guard.get(&user_id).cloned().unwrap_or_default())
    }

    async fn unlock(
        &self,
        user_id: UserId,
        achievement_id: AchievementId,
        unlocked_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.unlocks)?;
        let unlocks = guard.entry(user_id).or_default();
        if unlocks.iter().any(|u| u.achievement_id == achievement_id) {
            return Ok(());
        }
        unlocks.push(Unlock {
            achievement_id,
            unlocked_at,
        });
        Ok(())
    }

    async fn upsert_achievement(&self, achievement: &Achievement) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.achievements)?;
        guard.insert(achievement.id(), achievement.clone());
        Ok(())
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionBank>,
    pub results: Arc<dyn ResultStore>,
    pub achievements: Arc<dyn AchievementStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let questions: Arc<dyn QuestionBank> = Arc::new(repo.clone());
        let results: Arc<dyn ResultStore> = Arc::new(repo.clone());
        let achievements: Arc<dyn AchievementStore> = Arc::new(repo);
        Self {
            questions,
            results,
            achievements,
        }
    }
}
