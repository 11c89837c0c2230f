use std::collections::BTreeSet;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuestionId, TopicId};
use crate::model::media::MediaUri;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question needs at least two options, got {0}")]
    TooFewOptions(usize),

    #[error("answer key references option {index} but there are only {options} options")]
    KeyIndexOutOfRange { index: usize, options: usize },

    #[error("answer key for a multiple-choice question cannot be empty")]
    EmptySelection,

    #[error("answer key for a sequence question cannot be empty")]
    EmptyOrdering,

    #[error("answer key ordering repeats option {0}")]
    DuplicateOrderingIndex(usize),

    #[error("invalid question kind: {0}")]
    InvalidKind(String),
}

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

/// The three question shapes the quiz supports.
///
/// - `Single`: pick exactly one option
/// - `Multiple`: pick a set of options, graded as an exact set match
/// - `Sequence`: arrange options in order, graded as an exact ordered match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionKind {
    Single,
    Multiple,
    Sequence,
}

impl QuestionKind {
    /// Storage representation of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Single => "single",
            QuestionKind::Multiple => "multiple",
            QuestionKind::Sequence => "sequence",
        }
    }

    /// Parses the storage representation.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidKind` for unknown values.
    pub fn from_str_codec(s: &str) -> Result<Self, QuestionError> {
        match s {
            "single" => Ok(QuestionKind::Single),
            "multiple" => Ok(QuestionKind::Multiple),
            "sequence" => Ok(QuestionKind::Sequence),
            other => Err(QuestionError::InvalidKind(other.to_owned())),
        }
    }
}

//
// ─── ANSWER KEY ────────────────────────────────────────────────────────────────
//

/// Correct-answer specification, tagged by question kind.
///
/// Variants index into the question's option list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerKey {
    /// The single correct option.
    Choice(usize),
    /// The exact set of correct options.
    Selection(BTreeSet<usize>),
    /// The required option ordering.
    Ordering(Vec<usize>),
}

impl AnswerKey {
    /// The question kind this key implies.
    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        match self {
            AnswerKey::Choice(_) => QuestionKind::Single,
            AnswerKey::Selection(_) => QuestionKind::Multiple,
            AnswerKey::Ordering(_) => QuestionKind::Sequence,
        }
    }

    fn validate(&self, option_count: usize) -> Result<(), QuestionError> {
        let check_index = |index: usize| {
            if index >= option_count {
                Err(QuestionError::KeyIndexOutOfRange {
                    index,
                    options: option_count,
                })
            } else {
                Ok(())
            }
        };

        match self {
            AnswerKey::Choice(index) => check_index(*index),
            AnswerKey::Selection(set) => {
                if set.is_empty() {
                    return Err(QuestionError::EmptySelection);
                }
                set.iter().try_for_each(|&i| check_index(i))
            }
            AnswerKey::Ordering(order) => {
                if order.is_empty() {
                    return Err(QuestionError::EmptyOrdering);
                }
                let mut seen = HashSet::with_capacity(order.len());
                for &index in order {
                    check_index(index)?;
                    if !seen.insert(index) {
                        return Err(QuestionError::DuplicateOrderingIndex(index));
                    }
                }
                Ok(())
            }
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A quiz question: prompt text, option labels, and the answer key.
///
/// Reference data, immutable once loaded. The key never leaves the engine;
/// callers render questions through [`QuestionView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    topic_id: TopicId,
    text: String,
    options: Vec<String>,
    key: AnswerKey,
    media: Option<MediaUri>,
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the text is blank, fewer than two options
    /// are given, or the key references options that do not exist.
    pub fn new(
        id: QuestionId,
        topic_id: TopicId,
        text: impl Into<String>,
        options: Vec<String>,
        key: AnswerKey,
        media: Option<MediaUri>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions(options.len()));
        }
        key.validate(options.len())?;

        Ok(Self {
            id,
            topic_id,
            text: text.trim().to_owned(),
            options,
            key,
            media,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn key(&self) -> &AnswerKey {
        &self.key
    }

    #[must_use]
    pub fn media(&self) -> Option<&MediaUri> {
        self.media.as_ref()
    }

    /// Kind derived from the answer key variant.
    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.key.kind()
    }

    /// The render shape: everything the presentation layer needs, minus the key.
    #[must_use]
    pub fn view(&self) -> QuestionView {
        QuestionView {
            id: self.id,
            text: self.text.clone(),
            kind: self.kind(),
            options: self.options.clone(),
            media: self.media.clone(),
        }
    }
}

//
// ─── QUESTION VIEW ─────────────────────────────────────────────────────────────
//

/// What the presentation layer sees: never carries the answer key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub id: QuestionId,
    pub text: String,
    pub kind: QuestionKind,
    pub options: Vec<String>,
    pub media: Option<MediaUri>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Option {i}")).collect()
    }

    #[test]
    fn question_new_rejects_empty_text() {
        let err = Question::new(
            QuestionId::new(1),
            TopicId::new(1),
            "  ",
            options(3),
            AnswerKey::Choice(0),
            None,
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::EmptyText);
    }

    #[test]
    fn question_new_rejects_single_option() {
        let err = Question::new(
            QuestionId::new(1),
            TopicId::new(1),
            "Pick one",
            options(1),
            AnswerKey::Choice(0),
            None,
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::TooFewOptions(1));
    }

    #[test]
    fn question_new_rejects_out_of_range_key() {
        let err = Question::new(
            QuestionId::new(1),
            TopicId::new(1),
            "Pick one",
            options(3),
            AnswerKey::Choice(3),
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            QuestionError::KeyIndexOutOfRange {
                index: 3,
                options: 3
            }
        );
    }

    #[test]
    fn question_new_rejects_empty_selection_key() {
        let err = Question::new(
            QuestionId::new(1),
            TopicId::new(1),
            "Pick all",
            options(3),
            AnswerKey::Selection(BTreeSet::new()),
            None,
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::EmptySelection);
    }

    #[test]
    fn question_new_rejects_duplicate_ordering() {
        let err = Question::new(
            QuestionId::new(1),
            TopicId::new(1),
            "Order these",
            options(3),
            AnswerKey::Ordering(vec![0, 1, 0]),
            None,
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::DuplicateOrderingIndex(0));
    }

    #[test]
    fn kind_follows_key_variant() {
        let q = Question::new(
            QuestionId::new(1),
            TopicId::new(1),
            "Order these",
            options(3),
            AnswerKey::Ordering(vec![2, 0, 1]),
            None,
        )
        .unwrap();
        assert_eq!(q.kind(), QuestionKind::Sequence);
    }

    #[test]
    fn view_omits_the_key() {
        let q = Question::new(
            QuestionId::new(7),
            TopicId::new(1),
            "Pick one",
            options(4),
            AnswerKey::Choice(2),
            None,
        )
        .unwrap();

        let view = q.view();
        assert_eq!(view.id, QuestionId::new(7));
        assert_eq!(view.kind, QuestionKind::Single);
        assert_eq!(view.options.len(), 4);
    }

    #[test]
    fn kind_codec_roundtrip() {
        for kind in [
            QuestionKind::Single,
            QuestionKind::Multiple,
            QuestionKind::Sequence,
        ] {
            assert_eq!(QuestionKind::from_str_codec(kind.as_str()).unwrap(), kind);
        }
        assert!(QuestionKind::from_str_codec("essay").is_err());
    }
}
