use quiz_core::model::QuestionView;

use crate::quiz::session::AnswerDraft;

/// Aggregated view of quiz progress, useful for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

/// Everything the presentation layer needs to render the current question.
///
/// Carries the keyless question view, a 1-based position, and a snapshot of
/// the user's draft so selection marks survive a re-render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPrompt {
    pub view: QuestionView,
    pub number: usize,
    pub total: usize,
    pub draft: Option<AnswerDraft>,
}
