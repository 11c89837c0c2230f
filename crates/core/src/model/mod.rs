mod achievement;
mod answer;
mod ids;
mod media;
mod question;
mod result;
mod topic;

pub use ids::{AchievementId, ParseIdError, QuestionId, TopicId, UserId};

pub use achievement::{Achievement, AchievementError, AchievementRule, Unlock};
pub use answer::Answer;
pub use media::{MediaError, MediaUri};
pub use question::{AnswerKey, Question, QuestionError, QuestionKind, QuestionView};
pub use result::{Period, TestResult, TestResultError};
pub use topic::{Topic, TopicError};
