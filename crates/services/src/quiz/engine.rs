//! Quiz orchestration: start, answer, complete.
//!
//! Mutations on a running session happen inside one locked step of the
//! [`SessionStore`]; storage round-trips happen strictly outside those
//! steps, so a slow database never blocks another user's callbacks and a
//! completed session has already left the store before persistence runs.

use std::sync::Arc;

use quiz_core::model::{Answer, Question, QuestionId, TestResult, TopicId, UserId};
use rand::seq::{IndexedRandom, SliceRandom};
use storage::repository::QuestionBank;
use tracing::{debug, info};

use crate::Clock;
use crate::error::QuizError;
use crate::quiz::committer::ResultCommitter;
use crate::quiz::progress::QuestionPrompt;
use crate::quiz::session::{QuizSession, StepOutcome};
use crate::store::SessionStore;

/// What one submitted answer led to.
#[derive(Debug)]
pub enum AnswerOutcome {
    /// The quiz continues; render this prompt.
    Next(QuestionPrompt),
    /// That was the last question; the session is finished and scored.
    Completed(QuizReport),
}

/// Everything the presentation layer needs to render a finished quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizReport {
    pub topic_id: TopicId,
    pub correct: u32,
    pub total: u32,
    pub percentage: u8,
    pub time_spent: chrono::Duration,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    /// Per-question verdicts in quiz order.
    pub per_question: Vec<(QuestionId, bool)>,
    /// Achievements newly unlocked by this result.
    pub new_achievements: Vec<quiz_core::model::Achievement>,
    /// False when the result could not be written; the report is still
    /// complete and the session is gone either way.
    pub saved: bool,
}

/// The quiz session engine: the services crate's main entry point.
pub struct QuizEngine {
    clock: Clock,
    store: SessionStore,
    bank: Arc<dyn QuestionBank>,
    committer: ResultCommitter,
    shuffle_questions: bool,
}

impl QuizEngine {
    #[must_use]
    pub fn new(clock: Clock, bank: Arc<dyn QuestionBank>, committer: ResultCommitter) -> Self {
        Self {
            clock,
            store: SessionStore::new(),
            bank,
            committer,
            shuffle_questions: false,
        }
    }

    /// Enable or disable shuffling of the fetched question order.
    #[must_use]
    pub fn with_shuffle_questions(mut self, shuffle: bool) -> Self {
        self.shuffle_questions = shuffle;
        self
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Starts a quiz on `topic_id`, replacing any unfinished session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyTopic` when the topic has no questions, or a
    /// storage error from the question fetch.
    pub async fn start(
        &self,
        user_id: UserId,
        topic_id: TopicId,
    ) -> Result<QuestionPrompt, QuizError> {
        let mut questions: Vec<Question> = self.bank.list_questions(topic_id).await?;
        if questions.is_empty() {
            return Err(QuizError::EmptyTopic);
        }
        if self.shuffle_questions {
            questions.shuffle(&mut rand::rng());
        }

        info!(
            user = user_id.value(),
            topic = topic_id.value(),
            questions = questions.len(),
            "quiz started"
        );

        let session = QuizSession::new(user_id, topic_id, questions, self.clock.now());
        let prompt = session.prompt().ok_or(QuizError::EmptyTopic)?;
        self.store.put(session);
        Ok(prompt)
    }

    /// Starts a quiz on a randomly picked topic.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyTopic` when no topics exist or the picked
    /// topic has no questions.
    pub async fn start_random(&self, user_id: UserId) -> Result<QuestionPrompt, QuizError> {
        let topics = self.bank.list_topics().await?;
        let topic_id = topics
            .choose(&mut rand::rng())
            .map(quiz_core::model::Topic::id)
            .ok_or(QuizError::EmptyTopic)?;
        self.start(user_id, topic_id).await
    }

    /// The prompt for the user's current question.
    ///
    /// `Ok(None)` means every question is answered and [`Self::complete`]
    /// should run.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoActiveSession` when the user has no session.
    pub fn current_prompt(&self, user_id: UserId) -> Result<Option<QuestionPrompt>, QuizError> {
        self.store
            .with_session(user_id, |session| session.prompt())
            .ok_or(QuizError::NoActiveSession)
    }

    /// Toggles one option in a multiple-choice draft and returns the
    /// refreshed prompt.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` for a missing session, wrong question kind, or an
    /// out-of-range index.
    pub fn toggle_option(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        index: usize,
    ) -> Result<QuestionPrompt, QuizError> {
        self.store
            .with_session(user_id, |session| {
                session.toggle_selection(question_id, index)?;
                session.prompt().ok_or(QuizError::StaleQuestion)
            })
            .ok_or(QuizError::NoActiveSession)?
    }

    /// Appends one option to a sequence draft and returns the refreshed
    /// prompt. Duplicate taps report [`StepOutcome::AlreadySelected`]
    /// without changing the draft.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` for a missing session, wrong question kind, or an
    /// out-of-range index.
    pub fn record_sequence_step(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        index: usize,
    ) -> Result<(StepOutcome, QuestionPrompt), QuizError> {
        self.store
            .with_session(user_id, |session| {
                let outcome = session.push_ordering(question_id, index)?;
                let prompt = session.prompt().ok_or(QuizError::StaleQuestion)?;
                Ok((outcome, prompt))
            })
            .ok_or(QuizError::NoActiveSession)?
    }

    /// Resets a sequence draft to empty and returns the refreshed prompt.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoActiveSession` when the user has no session.
    pub fn reset_sequence(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> Result<QuestionPrompt, QuizError> {
        self.store
            .with_session(user_id, |session| {
                session.clear_ordering(question_id);
                session.prompt().ok_or(QuizError::StaleQuestion)
            })
            .ok_or(QuizError::NoActiveSession)?
    }

    /// Submits an answer for the current question.
    ///
    /// On the last question the session is removed from the store in the
    /// same locked step that records the answer, then scored and persisted.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::StaleQuestion` for an id mismatch (the session is
    /// unchanged), validation errors for a malformed answer, or
    /// `NoActiveSession`.
    pub async fn submit_answer(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        answer: Answer,
    ) -> Result<AnswerOutcome, QuizError> {
        self.submit_with(user_id, move |session| {
            session.record_answer(question_id, answer)
        })
        .await
    }

    /// Submits the stored draft for `question_id` (the confirm flow of
    /// multiple-choice and sequence questions).
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::submit_answer`].
    pub async fn confirm_answer(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> Result<AnswerOutcome, QuizError> {
        self.submit_with(user_id, move |session| {
            let answer = session.take_draft(question_id);
            session.record_answer(question_id, answer)
        })
        .await
    }

    /// Skips the current question, recording an explicitly empty answer.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::submit_answer`].
    pub async fn skip_question(&self, user_id: UserId) -> Result<AnswerOutcome, QuizError> {
        self.submit_with(user_id, |session| {
            let question_id = session
                .current_question()
                .map(Question::id)
                .ok_or(QuizError::StaleQuestion)?;
            session.record_answer(question_id, Answer::Skipped)
        })
        .await
    }

    /// Removes the user's session and scores it; the caller-driven
    /// completion path for when [`Self::current_prompt`] returns `None`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoActiveSession` when the user has no session.
    pub async fn complete(&self, user_id: UserId) -> Result<QuizReport, QuizError> {
        let session = self
            .store
            .remove(user_id)
            .ok_or(QuizError::NoActiveSession)?;
        self.finish(session).await
    }

    /// Runs one answer step under the entry lock and finishes the session
    /// when that step completed it.
    async fn submit_with(
        &self,
        user_id: UserId,
        record: impl FnOnce(&mut QuizSession) -> Result<bool, QuizError>,
    ) -> Result<AnswerOutcome, QuizError> {
        let (step, finished) = self
            .store
            .with_session_removing(user_id, |session| match record(session) {
                Ok(true) => (Ok(None), true),
                Ok(false) => match session.prompt() {
                    Some(prompt) => (Ok(Some(prompt)), false),
                    // Cursor past the end without completion flag; treat as
                    // finished rather than leaving a dead session behind.
                    None => (Ok(None), true),
                },
                Err(err) => (Err(err), false),
            })
            .ok_or(QuizError::NoActiveSession)?;

        let next = step?;
        if let Some(session) = finished {
            let report = self.finish(session).await?;
            return Ok(AnswerOutcome::Completed(report));
        }
        next.map(AnswerOutcome::Next)
            .ok_or(QuizError::NoActiveSession)
    }

    /// Scores a session that has already left the store and commits the
    /// result. Persistence failures are absorbed into `saved == false`.
    async fn finish(&self, session: QuizSession) -> Result<QuizReport, QuizError> {
        let completed_at = self.clock.now();
        let card = session.score_card();
        let time_spent = completed_at - session.started_at();

        debug!(
            user = session.user_id().value(),
            topic = session.topic_id().value(),
            correct = card.correct,
            total = card.total,
            "quiz finished"
        );

        let result = TestResult::from_parts(
            session.user_id(),
            session.topic_id(),
            card.correct,
            card.total,
            card.percentage,
            time_spent,
            completed_at,
        )?;
        let outcome = self.committer.commit(&result).await;

        Ok(QuizReport {
            topic_id: session.topic_id(),
            correct: card.correct,
            total: card.total,
            percentage: card.percentage,
            time_spent,
            completed_at,
            per_question: card.per_question,
            new_achievements: outcome.new_achievements,
            saved: outcome.saved,
        })
    }
}
