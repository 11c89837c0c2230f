use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use quiz_core::model::{
    Achievement, AchievementId, AchievementRule, Answer, AnswerKey, Question, QuestionId,
    QuestionKind, TestResult, Topic, TopicId, UserId,
};
use quiz_core::time::{fixed_clock, fixed_now};
use services::{AnswerOutcome, QuizEngine, QuizError, ResultCommitter, StepOutcome};
use storage::repository::{ResultStore, Storage, StorageError};

fn topic() -> TopicId {
    TopicId::new(1)
}

fn user() -> UserId {
    UserId::new(10)
}

async fn seed_topic(storage: &Storage) {
    let astronomy = Topic::new(topic(), "Astronomy", None).unwrap();
    storage.questions.upsert_topic(&astronomy).await.unwrap();

    let questions = vec![
        Question::new(
            QuestionId::new(1),
            topic(),
            "Pick the right option",
            vec!["A".into(), "B".into(), "C".into()],
            AnswerKey::Choice(2),
            None,
        )
        .unwrap(),
        Question::new(
            QuestionId::new(2),
            topic(),
            "Pick every right option",
            vec!["A".into(), "B".into(), "C".into()],
            AnswerKey::Selection(BTreeSet::from([0, 2])),
            None,
        )
        .unwrap(),
        Question::new(
            QuestionId::new(3),
            topic(),
            "Put these in order",
            vec!["A".into(), "B".into(), "C".into()],
            AnswerKey::Ordering(vec![1, 0, 2]),
            None,
        )
        .unwrap(),
        Question::new(
            QuestionId::new(4),
            topic(),
            "One more",
            vec!["A".into(), "B".into()],
            AnswerKey::Choice(0),
            None,
        )
        .unwrap(),
    ];
    for question in &questions {
        storage.questions.upsert_question(question).await.unwrap();
    }
}

async fn seed_achievements(storage: &Storage) {
    let catalog = [
        Achievement::new(
            AchievementId::new(1),
            "First Steps",
            "Complete your first test",
            10,
            AchievementRule::FirstTest,
        )
        .unwrap(),
        Achievement::new(
            AchievementId::new(2),
            "Perfectionist",
            "Score 100% on any test",
            50,
            AchievementRule::PerfectScore,
        )
        .unwrap(),
    ];
    for achievement in &catalog {
        storage
            .achievements
            .upsert_achievement(achievement)
            .await
            .unwrap();
    }
}

fn engine_over(storage: &Storage) -> QuizEngine {
    let committer =
        ResultCommitter::new(storage.results.clone(), storage.achievements.clone());
    QuizEngine::new(fixed_clock(), storage.questions.clone(), committer)
}

#[tokio::test]
async fn full_quiz_completes_on_the_last_answer_and_never_before() {
    let storage = Storage::in_memory();
    seed_topic(&storage).await;
    seed_achievements(&storage).await;
    let engine = engine_over(&storage);

    let prompt = engine.start(user(), topic()).await.unwrap();
    assert_eq!(prompt.number, 1);
    assert_eq!(prompt.total, 4);
    assert_eq!(prompt.view.kind, QuestionKind::Single);

    // Q1: correct single choice.
    let outcome = engine
        .submit_answer(user(), QuestionId::new(1), Answer::Choice(2))
        .await
        .unwrap();
    let AnswerOutcome::Next(prompt) = outcome else {
        panic!("quiz must not complete after one answer");
    };
    assert_eq!(prompt.number, 2);

    // Q2: assemble {0, 2} with one mis-toggle in the middle.
    engine.toggle_option(user(), QuestionId::new(2), 0).unwrap();
    engine.toggle_option(user(), QuestionId::new(2), 1).unwrap();
    engine.toggle_option(user(), QuestionId::new(2), 1).unwrap();
    let prompt = engine.toggle_option(user(), QuestionId::new(2), 2).unwrap();
    assert!(prompt.draft.is_some());
    let outcome = engine.confirm_answer(user(), QuestionId::new(2)).await.unwrap();
    assert!(matches!(outcome, AnswerOutcome::Next(_)));

    // Q3: build the right ordering, with a duplicate tap rejected softly
    // and one full reset along the way.
    let (step, _) = engine.record_sequence_step(user(), QuestionId::new(3), 0).unwrap();
    assert_eq!(step, StepOutcome::Appended);
    let (step, _) = engine.record_sequence_step(user(), QuestionId::new(3), 0).unwrap();
    assert_eq!(step, StepOutcome::AlreadySelected);
    let prompt = engine.reset_sequence(user(), QuestionId::new(3)).unwrap();
    assert!(matches!(
        prompt.draft,
        Some(services::AnswerDraft::Ordering(ref order)) if order.is_empty()
    ));
    for index in [1, 0, 2] {
        engine.record_sequence_step(user(), QuestionId::new(3), index).unwrap();
    }
    let outcome = engine.confirm_answer(user(), QuestionId::new(3)).await.unwrap();
    assert!(matches!(outcome, AnswerOutcome::Next(_)));

    // Q4: skip, which completes the quiz.
    let outcome = engine.skip_question(user()).await.unwrap();
    let AnswerOutcome::Completed(report) = outcome else {
        panic!("last answer must complete the quiz");
    };

    assert_eq!(report.correct, 3);
    assert_eq!(report.total, 4);
    assert_eq!(report.percentage, 75);
    assert!(report.saved);
    assert_eq!(
        report.per_question,
        vec![
            (QuestionId::new(1), true),
            (QuestionId::new(2), true),
            (QuestionId::new(3), true),
            (QuestionId::new(4), false),
        ]
    );
    let names: Vec<&str> = report
        .new_achievements
        .iter()
        .map(Achievement::name)
        .collect();
    assert_eq!(names, vec!["First Steps"]);

    // The session is gone; the store is idle again.
    assert!(matches!(
        engine.current_prompt(user()),
        Err(QuizError::NoActiveSession)
    ));
    assert!(engine.store().is_empty());

    let history = storage.results.list_results(user(), None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].percentage(), 75);
}

#[tokio::test]
async fn stale_submit_leaves_the_cursor_unchanged() {
    let storage = Storage::in_memory();
    seed_topic(&storage).await;
    let engine = engine_over(&storage);

    engine.start(user(), topic()).await.unwrap();
    let err = engine
        .submit_answer(user(), QuestionId::new(2), Answer::Choice(0))
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::StaleQuestion));

    let prompt = engine.current_prompt(user()).unwrap().unwrap();
    assert_eq!(prompt.number, 1);
    assert_eq!(prompt.view.id, QuestionId::new(1));
}

#[tokio::test]
async fn wrong_shape_and_out_of_range_answers_are_rejected() {
    let storage = Storage::in_memory();
    seed_topic(&storage).await;
    let engine = engine_over(&storage);

    engine.start(user(), topic()).await.unwrap();

    let err = engine
        .submit_answer(user(), QuestionId::new(1), Answer::Ordering(vec![0]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        QuizError::KindMismatch {
            expected: QuestionKind::Single
        }
    ));

    let err = engine
        .submit_answer(user(), QuestionId::new(1), Answer::Choice(9))
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::InvalidOption { index: 9, options: 3 }));

    let prompt = engine.current_prompt(user()).unwrap().unwrap();
    assert_eq!(prompt.number, 1);
}

#[tokio::test]
async fn wrong_multiple_and_sequence_answers_score_incorrect() {
    let storage = Storage::in_memory();
    seed_topic(&storage).await;
    let engine = engine_over(&storage);

    engine.start(user(), topic()).await.unwrap();
    engine
        .submit_answer(user(), QuestionId::new(1), Answer::Choice(0))
        .await
        .unwrap();
    // Superset of the key.
    engine
        .submit_answer(
            user(),
            QuestionId::new(2),
            Answer::Selection(BTreeSet::from([0, 1, 2])),
        )
        .await
        .unwrap();
    // Right elements, wrong order.
    engine
        .submit_answer(user(), QuestionId::new(3), Answer::Ordering(vec![0, 1, 2]))
        .await
        .unwrap();
    let outcome = engine
        .submit_answer(user(), QuestionId::new(4), Answer::Choice(1))
        .await
        .unwrap();

    let AnswerOutcome::Completed(report) = outcome else {
        panic!("fourth answer completes the quiz");
    };
    assert_eq!(report.correct, 0);
    assert_eq!(report.percentage, 0);
}

#[tokio::test]
async fn starting_again_discards_the_unfinished_session() {
    let storage = Storage::in_memory();
    seed_topic(&storage).await;
    let engine = engine_over(&storage);

    engine.start(user(), topic()).await.unwrap();
    engine
        .submit_answer(user(), QuestionId::new(1), Answer::Choice(2))
        .await
        .unwrap();

    let prompt = engine.start(user(), topic()).await.unwrap();
    assert_eq!(prompt.number, 1);
    assert_eq!(engine.store().len(), 1);

    // Nothing was persisted for the abandoned run.
    let history = storage.results.list_results(user(), None).await.unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn start_on_empty_topic_fails() {
    let storage = Storage::in_memory();
    let engine = engine_over(&storage);

    let err = engine.start(user(), TopicId::new(99)).await.unwrap_err();
    assert!(matches!(err, QuizError::EmptyTopic));

    let err = engine.start_random(user()).await.unwrap_err();
    assert!(matches!(err, QuizError::EmptyTopic));
}

#[tokio::test]
async fn achievement_evaluation_is_idempotent() {
    let storage = Storage::in_memory();
    seed_achievements(&storage).await;
    let committer =
        ResultCommitter::new(storage.results.clone(), storage.achievements.clone());

    let result = TestResult::from_parts(
        user(),
        topic(),
        4,
        4,
        100,
        Duration::minutes(2),
        fixed_now(),
    )
    .unwrap();
    storage.results.append_result(&result).await.unwrap();

    let first = committer.evaluate_achievements(user(), fixed_now()).await.unwrap();
    let names: Vec<&str> = first.iter().map(Achievement::name).collect();
    assert_eq!(names, vec!["First Steps", "Perfectionist"]);

    let second = committer.evaluate_achievements(user(), fixed_now()).await.unwrap();
    assert!(second.is_empty());
}

#[tokio::test]
async fn stats_respect_the_period_window() {
    let storage = Storage::in_memory();
    let committer =
        ResultCommitter::new(storage.results.clone(), storage.achievements.clone());

    let old = TestResult::from_parts(
        user(),
        topic(),
        1,
        4,
        25,
        Duration::minutes(4),
        fixed_now() - Duration::days(30),
    )
    .unwrap();
    let recent = TestResult::from_parts(
        user(),
        topic(),
        3,
        4,
        75,
        Duration::minutes(2),
        fixed_now() - Duration::days(1),
    )
    .unwrap();
    storage.results.append_result(&old).await.unwrap();
    storage.results.append_result(&recent).await.unwrap();

    let all = committer
        .stats(user(), quiz_core::model::Period::All, fixed_now())
        .await
        .unwrap();
    assert_eq!(all.tests, 2);
    assert_eq!(all.average_percentage, 50);
    assert_eq!(all.best_percentage, 75);
    assert_eq!(all.total_time, Duration::minutes(6));

    let week = committer
        .stats(user(), quiz_core::model::Period::Week, fixed_now())
        .await
        .unwrap();
    assert_eq!(week.tests, 1);
    assert_eq!(week.average_percentage, 75);
}

struct FailingResults;

#[async_trait::async_trait]
impl ResultStore for FailingResults {
    async fn append_result(&self, _result: &TestResult) -> Result<i64, StorageError> {
        Err(StorageError::Connection("database offline".into()))
    }

    async fn list_results(
        &self,
        _user_id: UserId,
        _completed_from: Option<DateTime<Utc>>,
    ) -> Result<Vec<TestResult>, StorageError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn persistence_failure_still_reports_and_clears_the_session() {
    let storage = Storage::in_memory();
    seed_topic(&storage).await;
    seed_achievements(&storage).await;

    let committer = ResultCommitter::new(Arc::new(FailingResults), storage.achievements.clone());
    let engine = QuizEngine::new(fixed_clock(), storage.questions.clone(), committer);

    engine.start(user(), topic()).await.unwrap();
    for (id, answer) in [
        (1, Answer::Choice(2)),
        (2, Answer::Selection(BTreeSet::from([0, 2]))),
        (3, Answer::Ordering(vec![1, 0, 2])),
    ] {
        engine.submit_answer(user(), QuestionId::new(id), answer).await.unwrap();
    }
    let outcome = engine
        .submit_answer(user(), QuestionId::new(4), Answer::Choice(0))
        .await
        .unwrap();

    let AnswerOutcome::Completed(report) = outcome else {
        panic!("last answer completes the quiz");
    };
    assert_eq!(report.percentage, 100);
    assert!(!report.saved);
    // No unlock evaluation against a history the write never joined.
    assert!(report.new_achievements.is_empty());
    assert!(
        storage
            .achievements
            .list_unlocked(user())
            .await
            .unwrap()
            .is_empty()
    );

    // The session is gone despite the failed write.
    assert!(matches!(
        engine.current_prompt(user()),
        Err(QuizError::NoActiveSession)
    ));
}
