use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::question::QuestionKind;

/// An answer value submitted for one question.
///
/// Mirrors the [`crate::model::AnswerKey`] shapes, plus `Skipped` for an
/// explicitly absent answer. A partially filled selection or ordering is a
/// legal submission; it simply scores as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    /// No answer given (skip, or confirm with nothing selected).
    Skipped,
    /// One option index, for `Single` questions.
    Choice(usize),
    /// A set of option indices, for `Multiple` questions.
    Selection(BTreeSet<usize>),
    /// An ordered list of option indices, for `Sequence` questions.
    Ordering(Vec<usize>),
}

impl Answer {
    /// Whether this value shape is acceptable for a question of `kind`.
    ///
    /// `Skipped` fits every kind.
    #[must_use]
    pub fn matches_kind(&self, kind: QuestionKind) -> bool {
        match self {
            Answer::Skipped => true,
            Answer::Choice(_) => kind == QuestionKind::Single,
            Answer::Selection(_) => kind == QuestionKind::Multiple,
            Answer::Ordering(_) => kind == QuestionKind::Sequence,
        }
    }

    /// Highest option index referenced, if any.
    #[must_use]
    pub fn max_index(&self) -> Option<usize> {
        match self {
            Answer::Skipped => None,
            Answer::Choice(i) => Some(*i),
            Answer::Selection(set) => set.iter().max().copied(),
            Answer::Ordering(order) => order.iter().max().copied(),
        }
    }

    /// True when no option was chosen at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Answer::Skipped => true,
            Answer::Choice(_) => false,
            Answer::Selection(set) => set.is_empty(),
            Answer::Ordering(order) => order.is_empty(),
        }
    }
}
