use std::collections::BTreeSet;
use std::fmt;

use quiz_core::model::{
    Achievement, AchievementId, AchievementRule, AnswerKey, Question, QuestionId, Topic, TopicId,
};
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    topic_id: TopicId,
    topic_name: String,
    topic_desc: Option<String>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidTopicId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidTopicId { raw } => write!(f, "invalid --topic-id value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut topic_id = std::env::var("QUIZ_TOPIC_ID")
            .ok()
            .and_then(|value| value.parse::<i64>().ok())
            .map_or_else(|| TopicId::new(1), TopicId::new);
        let mut topic_name =
            std::env::var("QUIZ_TOPIC_NAME").unwrap_or_else(|_| "General knowledge".into());
        let mut topic_desc = std::env::var("QUIZ_TOPIC_DESC").ok();

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--topic-id" => {
                    let value = require_value(&mut args, "--topic-id")?;
                    let parsed: i64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidTopicId { raw: value.clone() })?;
                    topic_id = TopicId::new(parsed);
                }
                "--topic-name" => {
                    let value = require_value(&mut args, "--topic-name")?;
                    topic_name = value;
                }
                "--topic-desc" => {
                    let value = require_value(&mut args, "--topic-desc")?;
                    topic_desc = Some(value);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            topic_id,
            topic_name,
            topic_desc,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --topic-id <id>           Topic id to upsert (default: 1)");
    eprintln!("  --topic-name <name>       Topic name (default: General knowledge)");
    eprintln!("  --topic-desc <text>       Optional topic description");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DB_URL, QUIZ_TOPIC_ID, QUIZ_TOPIC_NAME, QUIZ_TOPIC_DESC");
}

fn sample_questions(topic_id: TopicId) -> Result<Vec<Question>, Box<dyn std::error::Error>> {
    let base = topic_id.value() * 100;
    Ok(vec![
        Question::new(
            QuestionId::new(base + 1),
            topic_id,
            "Which planet is closest to the Sun?",
            vec![
                "Venus".into(),
                "Mercury".into(),
                "Mars".into(),
                "Earth".into(),
            ],
            AnswerKey::Choice(1),
            None,
        )?,
        Question::new(
            QuestionId::new(base + 2),
            topic_id,
            "Select every prime number.",
            vec!["2".into(), "4".into(), "7".into(), "9".into()],
            AnswerKey::Selection(BTreeSet::from([0, 2])),
            None,
        )?,
        Question::new(
            QuestionId::new(base + 3),
            topic_id,
            "Order these events from earliest to latest.",
            vec![
                "Moon landing".into(),
                "First powered flight".into(),
                "First satellite".into(),
            ],
            AnswerKey::Ordering(vec![1, 2, 0]),
            None,
        )?,
    ])
}

fn sample_achievements() -> Result<Vec<Achievement>, Box<dyn std::error::Error>> {
    Ok(vec![
        Achievement::new(
            AchievementId::new(1),
            "First Steps",
            "Complete your first test",
            10,
            AchievementRule::FirstTest,
        )?,
        Achievement::new(
            AchievementId::new(2),
            "Perfectionist",
            "Score 100% on any test",
            50,
            AchievementRule::PerfectScore,
        )?,
        Achievement::new(
            AchievementId::new(3),
            "Dedicated",
            "Complete ten tests",
            25,
            AchievementRule::TestCount(10),
        )?,
        Achievement::new(
            AchievementId::new(4),
            "Consistent",
            "Hold an 80% average over five tests",
            40,
            AchievementRule::AverageAtLeast {
                percent: 80,
                min_tests: 5,
            },
        )?,
    ])
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let storage = Storage::sqlite(&args.db_url).await?;

    let topic = Topic::new(args.topic_id, args.topic_name.clone(), args.topic_desc)?;
    storage.questions.upsert_topic(&topic).await?;

    let questions = sample_questions(topic.id())?;
    for question in &questions {
        storage.questions.upsert_question(question).await?;
    }

    let achievements = sample_achievements()?;
    for achievement in &achievements {
        storage.achievements.upsert_achievement(achievement).await?;
    }

    println!(
        "Seeded topic {} with {} questions and {} achievements into {}",
        topic.id().value(),
        questions.len(),
        achievements.len(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
