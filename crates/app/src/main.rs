use std::fmt;
use std::io::{self, BufRead, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quiz_core::{
    AnswerKey, QuestionCatalog, QuestionKind, QuizCategory, QuizSession, QuizSummary, SessionPhase,
};
use services::{Clock, FlowError, QuizFlow};
use storage::Storage;

const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
const DEFAULT_CATALOG: &str = include_str!("../data/questions.json");

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingValue { flag } => write!(f, "missing value for {flag}"),
            Self::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            Self::InvalidDbUrl { raw } => write!(f, "invalid sqlite url: {raw:?}"),
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

fn print_usage() {
    eprintln!("usage: quiz [OPTIONS]");
    eprintln!();
    eprintln!("options:");
    eprintln!("  --db <URL>        sqlite database url (default: {DEFAULT_DB_URL})");
    eprintln!("  --catalog <FILE>  load questions from FILE instead of the built-in set");
    eprintln!("  --memory          keep everything in memory, write nothing to disk");
    eprintln!("  --reset           clear the saved session and exit");
    eprintln!("  -h, --help        show this help");
    eprintln!();
    eprintln!("environment:");
    eprintln!("  QUIZ_DB_URL       overrides the default database url");
    eprintln!("  QUIZ_CATALOG      overrides the built-in question set");
}

#[derive(Debug)]
struct Args {
    db_url: String,
    catalog_path: Option<PathBuf>,
    in_memory: bool,
    reset: bool,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .map(|raw| normalize_sqlite_url(&raw))
            .unwrap_or_else(|_| DEFAULT_DB_URL.to_string());
        let mut catalog_path = std::env::var("QUIZ_CATALOG").ok().map(PathBuf::from);
        let mut in_memory = false;
        let mut reset = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let raw = require_value(&mut args, "--db")?;
                    if raw.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw });
                    }
                    db_url = normalize_sqlite_url(&raw);
                }
                "--catalog" => {
                    catalog_path = Some(PathBuf::from(require_value(&mut args, "--catalog")?));
                }
                "--memory" => in_memory = true,
                "--reset" => reset = true,
                "-h" | "--help" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            catalog_path,
            in_memory,
            reset,
        })
    }
}

/// Accepts `sqlite://...` urls, `sqlite:` prefixed paths and bare paths.
/// Relative paths are resolved against the current directory so the database
/// lands next to where the command was run, not wherever sqlx feels like.
fn normalize_sqlite_url(raw: &str) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw.to_string();
    }
    let path = raw.strip_prefix("sqlite:").unwrap_or(raw);
    let path = Path::new(path);
    if path.is_absolute() {
        format!("sqlite://{}", path.display())
    } else {
        let joined = std::env::current_dir()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|_| path.to_path_buf());
        format!("sqlite://{}", joined.display())
    }
}

/// sqlx will not create the database file on its own, so touch it (and its
/// parent directory) before connecting.
fn prepare_sqlite_file(db_url: &str) -> io::Result<()> {
    let Some(rest) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)?;
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_catalog(path: Option<&Path>) -> Result<QuestionCatalog, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            Ok(QuestionCatalog::from_json_str(&raw)?)
        }
        None => Ok(QuestionCatalog::from_json_str(DEFAULT_CATALOG)?),
    }
}

/// Loads the saved session, starting fresh when the store cannot be read.
async fn resume_session(flow: &QuizFlow) -> QuizSession {
    match flow.resume_or_new().await {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!(error = %err, "could not read the saved session, starting fresh");
            QuizSession::new()
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            eprintln!();
            print_usage();
            std::process::exit(2);
        }
    };

    let catalog = load_catalog(args.catalog_path.as_deref())?;
    if catalog.is_empty() {
        return Err("the question catalog is empty".into());
    }
    tracing::info!(questions = catalog.len(), "catalog ready");

    let storage = if args.in_memory {
        Storage::in_memory()
    } else {
        prepare_sqlite_file(&args.db_url)?;
        Storage::sqlite(&args.db_url).await?
    };

    let flow = QuizFlow::new(Clock::default(), catalog, Arc::clone(&storage.sessions));

    if args.reset {
        flow.clear_saved().await?;
        println!("saved session cleared");
        return Ok(());
    }

    let mut session = resume_session(&flow).await;
    if session.phase() != SessionPhase::NoPlayer {
        println!("Welcome back! Picking up where you left off.");
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        render(&flow, &session);
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let input = line.trim();
        if input.eq_ignore_ascii_case("q") {
            break;
        }
        if let Err(err) = dispatch(&flow, &mut session, input).await {
            tracing::error!(error = %err, "could not save the session");
            println!("(progress could not be saved, carrying on in memory)");
        }
    }

    println!("bye");
    Ok(())
}

fn render(flow: &QuizFlow, session: &QuizSession) {
    match session.phase() {
        SessionPhase::NoPlayer => {
            println!();
            println!("Welcome to the quiz. What should we call you? (q = quit)");
        }
        SessionPhase::CategorySelection => render_menu(flow, session),
        SessionPhase::InProgress => render_question(session),
        SessionPhase::ReviewingFeedback => render_feedback(session),
        SessionPhase::Completed => render_results(session),
    }
}

fn render_menu(flow: &QuizFlow, session: &QuizSession) {
    println!();
    println!("Hi {}! Pick a category:", session.player().unwrap_or("there"));
    for (position, category) in QuizCategory::ALL.iter().enumerate() {
        let count = flow.catalog().questions_in(*category).len();
        println!(
            "  {}) {:<13} {count} questions",
            position + 1,
            category_label(*category),
        );
    }
    println!("  q) quit");
}

fn category_label(category: QuizCategory) -> &'static str {
    match category {
        QuizCategory::TrueFalse => "True / False",
        QuizCategory::SingleChoice => "Single choice",
        QuizCategory::MultiSelect => "Multi select",
    }
}

fn render_question(session: &QuizSession) {
    let Some(question) = session.current_question() else {
        println!();
        println!("No questions in this category. (s = results, h = home, q = quit)");
        return;
    };
    println!();
    let answered = if session.is_current_answered() {
        "  [answered]"
    } else {
        ""
    };
    println!(
        "Question {}/{}{answered}",
        session.current_index() + 1,
        session.question_count(),
    );
    println!("{}", question.text());
    if question.kind() == QuestionKind::Multi {
        println!("(select every answer that applies)");
    }
    for (position, option) in question.options().iter().enumerate() {
        let mark = if session.selected_options().contains(option) {
            "x"
        } else {
            " "
        };
        println!("  {}) [{mark}] {option}", position + 1);
    }
    println!("(number = toggle, c = check, b = back, s = submit early, h = home, q = quit)");
}

fn render_feedback(session: &QuizSession) {
    println!();
    if session.last_answer_correct() {
        println!("Correct!");
    } else {
        println!("Not quite.");
        if let Some(question) = session.current_question() {
            match question.answer_key() {
                AnswerKey::Single(answer) => println!("The answer is: {answer}"),
                AnswerKey::Multi(answers) => println!("The answers are: {}", answers.join(", ")),
            }
        }
    }
    println!("(n = next, h = home, q = quit)");
}

fn render_results(session: &QuizSession) {
    let summary = QuizSummary::from_session(session);
    println!();
    println!("=== results ===");
    if let Some(player) = session.player() {
        println!("player:   {player}");
    }
    println!(
        "score:    {}/{} ({}%)",
        summary.score(),
        summary.question_count(),
        summary.percentage(),
    );
    println!(
        "time:     {}s total, {}s per answer",
        summary.total_time_secs(),
        summary.average_time_secs(),
    );
    for record in summary.history() {
        let mark = if record.is_correct { "+" } else { "-" };
        println!("  {mark} {}", record.question_text);
        println!("      you said: {}", record.user_answer.join(", "));
    }
    println!("(r = play again, h = home, q = quit)");
}

async fn dispatch(
    flow: &QuizFlow,
    session: &mut QuizSession,
    input: &str,
) -> Result<(), FlowError> {
    match session.phase() {
        SessionPhase::NoPlayer => {
            if flow.set_player(session, input).await?.is_ignored() {
                println!("A name, please.");
            }
        }
        SessionPhase::CategorySelection => {
            let category = match input {
                "1" => Some(QuizCategory::TrueFalse),
                "2" => Some(QuizCategory::SingleChoice),
                "3" => Some(QuizCategory::MultiSelect),
                other => other.parse().ok(),
            };
            match category {
                Some(category) => {
                    flow.select_category(session, category).await?;
                }
                None => println!("Pick 1, 2 or 3."),
            }
        }
        SessionPhase::InProgress => return in_progress(flow, session, input).await,
        SessionPhase::ReviewingFeedback => match input {
            "n" | "" => {
                flow.advance(session).await?;
            }
            "h" => {
                flow.go_home(session).await?;
            }
            _ => println!("n moves on, h goes home."),
        },
        SessionPhase::Completed => match input {
            "r" => {
                flow.restart(session).await?;
            }
            "h" => {
                flow.go_home(session).await?;
            }
            _ => println!("r plays again, h goes home."),
        },
    }
    Ok(())
}

async fn in_progress(
    flow: &QuizFlow,
    session: &mut QuizSession,
    input: &str,
) -> Result<(), FlowError> {
    if let Ok(number) = input.parse::<usize>() {
        let option = number
            .checked_sub(1)
            .and_then(|position| {
                session
                    .current_question()
                    .and_then(|question| question.options().get(position))
            })
            .cloned();
        match option {
            Some(option) => {
                flow.toggle_option(session, &option).await?;
            }
            None => println!("No option {number} here."),
        }
        return Ok(());
    }
    match input {
        "c" => {
            if flow.commit_answer(session).await?.is_ignored() {
                println!("Select an answer first.");
            }
        }
        "b" => {
            if flow.go_back(session).await?.is_ignored() {
                println!("Already at the first question.");
            }
        }
        "s" => {
            flow.submit_early(session).await?;
        }
        "h" => {
            flow.go_home(session).await?;
        }
        "" => {}
        _ => println!("c checks, b goes back, s submits, h goes home."),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
