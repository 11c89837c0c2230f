//! The quiz session engine and its supporting pieces.

mod committer;
mod engine;
mod progress;
mod session;

pub use committer::{CommitOutcome, ResultCommitter, StatsSummary};
pub use engine::{AnswerOutcome, QuizEngine, QuizReport};
pub use progress::{QuestionPrompt, QuizProgress};
pub use session::{AnswerDraft, QuizSession, StepOutcome};
