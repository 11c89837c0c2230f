use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::AchievementId;
use crate::model::result::TestResult;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AchievementError {
    #[error("achievement name cannot be empty")]
    EmptyName,

    #[error("unknown achievement rule: {0}")]
    UnknownRule(String),

    #[error("achievement rule {0} requires a threshold")]
    MissingThreshold(&'static str),

    #[error("invalid threshold for rule {rule}: {value}")]
    InvalidThreshold { rule: &'static str, value: i64 },
}

//
// ─── UNLOCK RULES ──────────────────────────────────────────────────────────────
//

/// Unlock predicate evaluated against a user's full result history.
///
/// Evaluation is pure and order-independent: re-running over unchanged
/// history yields the same verdicts, so unlocking stays idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementRule {
    /// Completed at least one test.
    FirstTest,
    /// Completed at least this many tests.
    TestCount(u32),
    /// Scored 100% on any single test.
    PerfectScore,
    /// Average percentage at least `percent` over at least `min_tests` tests.
    AverageAtLeast { percent: u8, min_tests: u32 },
}

impl AchievementRule {
    /// Whether the rule holds for this history.
    #[must_use]
    pub fn is_met(&self, history: &[TestResult]) -> bool {
        match self {
            AchievementRule::FirstTest => !history.is_empty(),
            AchievementRule::TestCount(n) => history.len() >= *n as usize,
            AchievementRule::PerfectScore => history.iter().any(|r| r.percentage() == 100),
            AchievementRule::AverageAtLeast { percent, min_tests } => {
                if history.len() < *min_tests as usize || history.is_empty() {
                    return false;
                }
                let sum: u64 = history.iter().map(|r| u64::from(r.percentage())).sum();
                let count = history.len() as u64;
                sum >= u64::from(*percent) * count
            }
        }
    }

    /// Storage code for the rule family.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            AchievementRule::FirstTest => "first_test",
            AchievementRule::TestCount(_) => "test_count",
            AchievementRule::PerfectScore => "perfect_score",
            AchievementRule::AverageAtLeast { .. } => "average_at_least",
        }
    }

    /// Threshold column value paired with [`Self::code`].
    ///
    /// `AverageAtLeast` packs percent and minimum test count as
    /// `percent * 1000 + min_tests`; the other rules use the value directly.
    #[must_use]
    pub fn threshold(&self) -> Option<i64> {
        match self {
            AchievementRule::FirstTest | AchievementRule::PerfectScore => None,
            AchievementRule::TestCount(n) => Some(i64::from(*n)),
            AchievementRule::AverageAtLeast { percent, min_tests } => {
                Some(i64::from(*percent) * 1000 + i64::from(*min_tests))
            }
        }
    }

    /// Decodes the storage representation.
    ///
    /// # Errors
    ///
    /// Returns `AchievementError` for unknown codes or unusable thresholds.
    pub fn from_code(code: &str, threshold: Option<i64>) -> Result<Self, AchievementError> {
        match code {
            "first_test" => Ok(AchievementRule::FirstTest),
            "perfect_score" => Ok(AchievementRule::PerfectScore),
            "test_count" => {
                let raw = threshold.ok_or(AchievementError::MissingThreshold("test_count"))?;
                let n = u32::try_from(raw).map_err(|_| AchievementError::InvalidThreshold {
                    rule: "test_count",
                    value: raw,
                })?;
                if n == 0 {
                    return Err(AchievementError::InvalidThreshold {
                        rule: "test_count",
                        value: raw,
                    });
                }
                Ok(AchievementRule::TestCount(n))
            }
            "average_at_least" => {
                let raw =
                    threshold.ok_or(AchievementError::MissingThreshold("average_at_least"))?;
                let invalid = || AchievementError::InvalidThreshold {
                    rule: "average_at_least",
                    value: raw,
                };
                let percent = u8::try_from(raw / 1000).map_err(|_| invalid())?;
                let min_tests = u32::try_from(raw % 1000).map_err(|_| invalid())?;
                if percent > 100 || min_tests == 0 {
                    return Err(invalid());
                }
                Ok(AchievementRule::AverageAtLeast { percent, min_tests })
            }
            other => Err(AchievementError::UnknownRule(other.to_owned())),
        }
    }
}

//
// ─── ACHIEVEMENT ───────────────────────────────────────────────────────────────
//

/// An unlockable award: definition plus rule. Reference data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Achievement {
    id: AchievementId,
    name: String,
    description: String,
    points: u32,
    rule: AchievementRule,
}

impl Achievement {
    /// Creates an achievement definition.
    ///
    /// # Errors
    ///
    /// Returns `AchievementError::EmptyName` for a blank name.
    pub fn new(
        id: AchievementId,
        name: impl Into<String>,
        description: impl Into<String>,
        points: u32,
        rule: AchievementRule,
    ) -> Result<Self, AchievementError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AchievementError::EmptyName);
        }

        Ok(Self {
            id,
            name: name.trim().to_owned(),
            description: description.into().trim().to_owned(),
            points,
            rule,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> AchievementId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    #[must_use]
    pub fn rule(&self) -> AchievementRule {
        self.rule
    }
}

/// One unlocked achievement for a user. Never revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unlock {
    pub achievement_id: AchievementId,
    pub unlocked_at: DateTime<Utc>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TopicId, UserId};
    use crate::time::fixed_now;
    use chrono::Duration;

    fn result(percentage: u8) -> TestResult {
        let score = u32::from(percentage) / 25;
        TestResult::from_parts(
            UserId::new(1),
            TopicId::new(1),
            score,
            4,
            percentage,
            Duration::minutes(2),
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn first_test_needs_one_result() {
        assert!(!AchievementRule::FirstTest.is_met(&[]));
        assert!(AchievementRule::FirstTest.is_met(&[result(50)]));
    }

    #[test]
    fn test_count_threshold() {
        let history = vec![result(50), result(75)];
        assert!(AchievementRule::TestCount(2).is_met(&history));
        assert!(!AchievementRule::TestCount(3).is_met(&history));
    }

    #[test]
    fn perfect_score_needs_a_hundred() {
        assert!(!AchievementRule::PerfectScore.is_met(&[result(75), result(50)]));
        assert!(AchievementRule::PerfectScore.is_met(&[result(75), result(100)]));
    }

    #[test]
    fn average_needs_enough_tests_and_score() {
        let rule = AchievementRule::AverageAtLeast {
            percent: 80,
            min_tests: 3,
        };
        assert!(!rule.is_met(&[result(100), result(100)]));
        assert!(!rule.is_met(&[result(100), result(75), result(50)]));
        assert!(rule.is_met(&[result(100), result(75), result(75)]));
    }

    #[test]
    fn rule_codec_roundtrip() {
        let rules = [
            AchievementRule::FirstTest,
            AchievementRule::TestCount(10),
            AchievementRule::PerfectScore,
            AchievementRule::AverageAtLeast {
                percent: 90,
                min_tests: 5,
            },
        ];
        for rule in rules {
            let decoded = AchievementRule::from_code(rule.code(), rule.threshold()).unwrap();
            assert_eq!(decoded, rule);
        }
    }

    #[test]
    fn rule_codec_rejects_bad_input() {
        assert!(matches!(
            AchievementRule::from_code("streak", None),
            Err(AchievementError::UnknownRule(_))
        ));
        assert!(matches!(
            AchievementRule::from_code("test_count", None),
            Err(AchievementError::MissingThreshold(_))
        ));
        assert!(matches!(
            AchievementRule::from_code("test_count", Some(0)),
            Err(AchievementError::InvalidThreshold { .. })
        ));
        assert!(matches!(
            AchievementRule::from_code("average_at_least", Some(150_000)),
            Err(AchievementError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn achievement_rejects_empty_name() {
        let err = Achievement::new(
            AchievementId::new(1),
            " ",
            "desc",
            10,
            AchievementRule::FirstTest,
        )
        .unwrap_err();
        assert_eq!(err, AchievementError::EmptyName);
    }
}
