//! In-memory state of one running quiz.
//!
//! All mechanics here are synchronous; the engine wraps each call in a
//! single locked step of the session store.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use quiz_core::model::{Answer, Question, QuestionId, QuestionKind, TopicId, UserId};
use quiz_core::scoring::{self, ScoreCard};

use crate::error::QuizError;
use crate::quiz::progress::{QuestionPrompt, QuizProgress};

/// A not-yet-submitted answer being assembled for the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerDraft {
    /// Toggled option set for a multiple-choice question.
    Selection(BTreeSet<usize>),
    /// Tapped-so-far ordering for a sequence question.
    Ordering(Vec<usize>),
}

/// Outcome of appending one step to a sequence draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Appended,
    /// The option is already part of the ordering; the draft is unchanged.
    AlreadySelected,
}

/// One user's quiz run over a fixed question list.
///
/// `current` indexes the question awaiting an answer; it can reach
/// `questions.len()` only transiently, between the last answer and
/// completion. Never advances more than once per logical answer.
pub struct QuizSession {
    user_id: UserId,
    topic_id: TopicId,
    questions: Vec<Question>,
    current: usize,
    answers: HashMap<QuestionId, Answer>,
    drafts: HashMap<QuestionId, AnswerDraft>,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    /// Builds a session positioned at the first question.
    ///
    /// The caller guarantees a non-empty question list.
    #[must_use]
    pub fn new(
        user_id: UserId,
        topic_id: TopicId,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            topic_id,
            questions,
            current: 0,
            answers: HashMap::new(),
            drafts: HashMap::new(),
            started_at,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The question awaiting an answer, `None` once the cursor is past the
    /// end.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        let total = self.questions.len();
        let answered = self.current.min(total);
        QuizProgress {
            total,
            answered,
            remaining: total - answered,
            is_complete: answered == total,
        }
    }

    /// Render shape for the current question, with the draft snapshot.
    #[must_use]
    pub fn prompt(&self) -> Option<QuestionPrompt> {
        let question = self.current_question()?;
        Some(QuestionPrompt {
            view: question.view(),
            number: self.current + 1,
            total: self.questions.len(),
            draft: self.drafts.get(&question.id()).cloned(),
        })
    }

    /// Toggles one option in the multiple-choice draft.
    ///
    /// A stale `question_id` is a silent no-op: the tap raced a submit and
    /// there is nothing left to update.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the current question is not multiple-choice or
    /// the index is out of range.
    pub fn toggle_selection(
        &mut self,
        question_id: QuestionId,
        index: usize,
    ) -> Result<(), QuizError> {
        let Some(question) = self.current_of(question_id) else {
            return Ok(());
        };
        if question.kind() != QuestionKind::Multiple {
            return Err(QuizError::KindMismatch {
                expected: question.kind(),
            });
        }
        let options = question.options().len();
        if index >= options {
            return Err(QuizError::InvalidOption { index, options });
        }

        let draft = self
            .drafts
            .entry(question_id)
            .or_insert_with(|| AnswerDraft::Selection(BTreeSet::new()));
        if let AnswerDraft::Selection(set) = draft {
            if !set.remove(&index) {
                set.insert(index);
            }
        }
        Ok(())
    }

    /// Appends one option to the sequence draft.
    ///
    /// Duplicates are rejected softly with [`StepOutcome::AlreadySelected`]
    /// so the presentation layer can notify instead of erroring.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the current question is not a sequence or the
    /// index is out of range.
    pub fn push_ordering(
        &mut self,
        question_id: QuestionId,
        index: usize,
    ) -> Result<StepOutcome, QuizError> {
        let Some(question) = self.current_of(question_id) else {
            return Ok(StepOutcome::Appended);
        };
        if question.kind() != QuestionKind::Sequence {
            return Err(QuizError::KindMismatch {
                expected: question.kind(),
            });
        }
        let options = question.options().len();
        if index >= options {
            return Err(QuizError::InvalidOption { index, options });
        }

        let draft = self
            .drafts
            .entry(question_id)
            .or_insert_with(|| AnswerDraft::Ordering(Vec::new()));
        if let AnswerDraft::Ordering(order) = draft {
            if order.contains(&index) {
                return Ok(StepOutcome::AlreadySelected);
            }
            order.push(index);
        }
        Ok(StepOutcome::Appended)
    }

    /// Resets the sequence draft to empty.
    pub fn clear_ordering(&mut self, question_id: QuestionId) {
        if let Some(AnswerDraft::Ordering(order)) = self.drafts.get_mut(&question_id) {
            order.clear();
        }
    }

    /// Finalizes the draft for `question_id` into a submittable answer.
    ///
    /// A missing draft becomes the empty value of the question's shape, so
    /// confirming with nothing selected submits an empty (incorrect) answer
    /// rather than failing.
    pub fn take_draft(&mut self, question_id: QuestionId) -> Answer {
        match self.drafts.remove(&question_id) {
            Some(AnswerDraft::Selection(set)) => Answer::Selection(set),
            Some(AnswerDraft::Ordering(order)) => Answer::Ordering(order),
            None => match self.current_of(question_id).map(Question::kind) {
                Some(QuestionKind::Multiple) => Answer::Selection(BTreeSet::new()),
                Some(QuestionKind::Sequence) => Answer::Ordering(Vec::new()),
                _ => Answer::Skipped,
            },
        }
    }

    /// Validates and records `answer` for the current question and advances
    /// the cursor exactly once.
    ///
    /// Returns `true` when this answer completed the quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::StaleQuestion` when `question_id` is not current
    /// (the session is left untouched), `KindMismatch` or `InvalidOption`
    /// for a malformed answer.
    pub fn record_answer(
        &mut self,
        question_id: QuestionId,
        answer: Answer,
    ) -> Result<bool, QuizError> {
        let Some(question) = self.current_of(question_id) else {
            return Err(QuizError::StaleQuestion);
        };
        if !answer.matches_kind(question.kind()) {
            return Err(QuizError::KindMismatch {
                expected: question.kind(),
            });
        }
        let options = question.options().len();
        if let Some(index) = answer.max_index()
            && index >= options
        {
            return Err(QuizError::InvalidOption { index, options });
        }

        self.drafts.remove(&question_id);
        self.answers.insert(question_id, answer);
        self.current += 1;
        Ok(self.current == self.questions.len())
    }

    /// Grades every question against the recorded answers.
    #[must_use]
    pub fn score_card(&self) -> ScoreCard {
        scoring::score(&self.questions, &self.answers)
    }

    fn current_of(&self, question_id: QuestionId) -> Option<&Question> {
        self.current_question()
            .filter(|question| question.id() == question_id)
    }
}
