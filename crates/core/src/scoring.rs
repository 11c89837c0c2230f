//! Grading for completed sessions.
//!
//! Single and multiple questions score correct only on an exact match
//! against the key; sequence questions only on an exact ordered match.

use std::collections::HashMap;

use crate::model::{Answer, AnswerKey, Question, QuestionId};

/// Grades one answer against a question's key.
///
/// A missing, skipped, or wrongly shaped answer is simply incorrect.
#[must_use]
pub fn grade(key: &AnswerKey, answer: &Answer) -> bool {
    match (key, answer) {
        (AnswerKey::Choice(expected), Answer::Choice(given)) => expected == given,
        (AnswerKey::Selection(expected), Answer::Selection(given)) => expected == given,
        (AnswerKey::Ordering(expected), Answer::Ordering(given)) => expected == given,
        _ => false,
    }
}

/// Percentage as the nearest integer: round(100 * correct / total).
///
/// # Panics
///
/// Does not panic; `total == 0` yields 0.
#[must_use]
pub fn percentage(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (f64::from(correct) * 100.0 / f64::from(total)).round();
    // correct <= total keeps this within 0..=100.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        pct as u8
    }
}

/// Scoring summary for one completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreCard {
    pub correct: u32,
    pub total: u32,
    pub percentage: u8,
    /// Per-question verdicts in quiz order.
    pub per_question: Vec<(QuestionId, bool)>,
}

/// Scores every question of a session against recorded answers.
///
/// Questions without a recorded answer count as incorrect.
#[must_use]
pub fn score(questions: &[Question], answers: &HashMap<QuestionId, Answer>) -> ScoreCard {
    let mut per_question = Vec::with_capacity(questions.len());
    let mut correct = 0_u32;

    for question in questions {
        let verdict = answers
            .get(&question.id())
            .is_some_and(|answer| grade(question.key(), answer));
        if verdict {
            correct += 1;
        }
        per_question.push((question.id(), verdict));
    }

    let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);
    ScoreCard {
        correct,
        total,
        percentage: percentage(correct, total),
        per_question,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TopicId;
    use std::collections::BTreeSet;

    fn options(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Option {i}")).collect()
    }

    fn question(id: i64, key: AnswerKey) -> Question {
        Question::new(
            QuestionId::new(id),
            TopicId::new(1),
            format!("Question {id}"),
            options(4),
            key,
            None,
        )
        .unwrap()
    }

    #[test]
    fn single_scores_on_exact_index() {
        let key = AnswerKey::Choice(2);
        assert!(grade(&key, &Answer::Choice(2)));
        assert!(!grade(&key, &Answer::Choice(1)));
        assert!(!grade(&key, &Answer::Skipped));
    }

    #[test]
    fn multiple_scores_on_exact_set() {
        let key = AnswerKey::Selection(BTreeSet::from([0, 2]));
        assert!(grade(&key, &Answer::Selection(BTreeSet::from([0, 2]))));
        assert!(!grade(&key, &Answer::Selection(BTreeSet::from([0, 1, 2]))));
        assert!(!grade(&key, &Answer::Selection(BTreeSet::from([0]))));
    }

    #[test]
    fn sequence_scores_on_exact_order() {
        let key = AnswerKey::Ordering(vec![1, 0, 2]);
        assert!(grade(&key, &Answer::Ordering(vec![1, 0, 2])));
        assert!(!grade(&key, &Answer::Ordering(vec![0, 1, 2])));
    }

    #[test]
    fn kind_mismatch_is_incorrect() {
        let key = AnswerKey::Choice(0);
        assert!(!grade(&key, &Answer::Selection(BTreeSet::from([0]))));
    }

    #[test]
    fn percentage_rounds_to_nearest() {
        assert_eq!(percentage(3, 4), 75);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(0, 5), 0);
        assert_eq!(percentage(5, 5), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn score_counts_missing_answers_as_incorrect() {
        let questions = vec![
            question(1, AnswerKey::Choice(2)),
            question(2, AnswerKey::Selection(BTreeSet::from([0, 2]))),
            question(3, AnswerKey::Ordering(vec![1, 0, 2])),
            question(4, AnswerKey::Choice(0)),
        ];

        let mut answers = HashMap::new();
        answers.insert(QuestionId::new(1), Answer::Choice(2));
        answers.insert(
            QuestionId::new(2),
            Answer::Selection(BTreeSet::from([0, 2])),
        );
        answers.insert(QuestionId::new(3), Answer::Ordering(vec![1, 0, 2]));
        // question 4 left unanswered

        let card = score(&questions, &answers);
        assert_eq!(card.correct, 3);
        assert_eq!(card.total, 4);
        assert_eq!(card.percentage, 75);
        assert_eq!(
            card.per_question,
            vec![
                (QuestionId::new(1), true),
                (QuestionId::new(2), true),
                (QuestionId::new(3), true),
                (QuestionId::new(4), false),
            ]
        );
    }
}
