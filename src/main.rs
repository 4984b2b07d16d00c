use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use quiz_grade::output;
use quiz_grade::quiz::{self, Quiz};
use quiz_grade::scoring::{score_submission, Answer};
use quiz_grade::share_code;
use quiz_grade::submission::{self, Submission, SubmissionStore};

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 1;
const EXIT_STORE: i32 = 2;
const EXIT_SUBMISSION: i32 = 3;
const EXIT_QUIZ: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a quiz definition and report every problem found
    Check {
        /// Quiz definition (YAML)
        quiz: PathBuf,
    },
    /// Print the student-facing view of a quiz as JSON (no correct answers)
    Public {
        quiz: PathBuf,
    },
    /// Preview the score for a set of answers without recording anything
    Score {
        quiz: PathBuf,
        /// Answers JSON file, or "-" for stdin
        answers: PathBuf,
        /// Print the full score as JSON
        #[arg(long, conflicts_with = "tsv")]
        json: bool,
        /// Print per-question scores as tab-separated values
        #[arg(long)]
        tsv: bool,
    },
    /// Start a new submission and print its id
    Start {
        quiz: PathBuf,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Score and finalize a started submission
    Submit {
        quiz: PathBuf,
        /// Id printed by `start`
        submission_id: String,
        /// Answers JSON file, or "-" for stdin
        answers: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Export finalized submissions of a quiz as CSV
    Export {
        quiz: PathBuf,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Generate a share code not used by any quiz with stored submissions,
    /// nor by any quiz file passed with --quiz
    ShareCode {
        /// Code length; skips the uniqueness check
        #[arg(short, long, conflicts_with = "quizzes")]
        length: Option<usize>,
        /// Quiz definition whose share code is also taken (repeatable)
        #[arg(long = "quiz", value_name = "QUIZ")]
        quizzes: Vec<PathBuf>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "quiz-grade")]
#[command(about = "Score multiple-choice quiz submissions", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the submission store (defaults to ~/.config/quiz-grade/submissions.json)
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_with(code: i32, message: impl std::fmt::Display) -> ! {
    eprintln!("{}", message);
    std::process::exit(code);
}

/// Load a quiz and refuse to continue unless it validates.
fn load_valid_quiz(path: &Path) -> Quiz {
    let quiz = match quiz::load_quiz(path) {
        Ok(q) => q,
        Err(e) => exit_with(EXIT_QUIZ, format!("Quiz error: {:#}", e)),
    };

    if let Err(errors) = quiz::validate_quiz(&quiz) {
        eprintln!("Quiz definition errors in {}:", path.display());
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_QUIZ);
    }

    for id in quiz.zero_correct_questions() {
        eprintln!(
            "Warning: question '{}' has no correct option and will always score full credit",
            id
        );
    }

    debug!(title = %quiz.title, questions = quiz.questions.len(), "loaded quiz");
    quiz
}

fn read_answers(path: &Path) -> Result<Vec<Answer>> {
    let content = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read answers from stdin")?;
        buf
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read answers file at {}", path.display()))?
    };

    serde_json::from_str(&content)
        .context("Failed to parse answers: expected a JSON array of {question_id, selected_option_ids}")
}

fn store_path(cli_store: Option<PathBuf>) -> PathBuf {
    match cli_store {
        Some(p) => p,
        None => match submission::default_store_path() {
            Ok(p) => p,
            Err(e) => exit_with(EXIT_STORE, format!("Store error: {:#}", e)),
        },
    }
}

fn load_store_or_exit(path: &Path) -> SubmissionStore {
    match submission::load_store(path) {
        Ok(s) => s,
        Err(e) => exit_with(EXIT_STORE, format!("Store error: {:#}", e)),
    }
}

fn save_store_or_exit(path: &Path, store: &SubmissionStore) {
    if let Err(e) = submission::save_store(path, store) {
        exit_with(EXIT_STORE, format!("Store error: {:#}", e));
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let use_colors = output::should_use_colors();

    match cli.command {
        Commands::Check { quiz } => {
            let quiz = load_valid_quiz(&quiz);
            let max: f64 = quiz.questions.iter().map(|q| q.points).sum();
            println!(
                "{}: {} questions, {} points, default mode {}",
                quiz.title,
                quiz.questions.len(),
                output::format_points(max),
                quiz.scoring_mode
            );
        }
        Commands::Public { quiz } => {
            let quiz = load_valid_quiz(&quiz);
            let view = serde_json::json!({
                "title": quiz.title,
                "description": quiz.description,
                "scoring_mode": quiz.scoring_mode,
                "time_limit": quiz.time_limit,
                "share_code": quiz.share_code,
                "questions": quiz.public_questions(),
            });
            match serde_json::to_string_pretty(&view) {
                Ok(s) => println!("{}", s),
                Err(e) => exit_with(EXIT_INPUT, format!("Failed to serialize quiz: {}", e)),
            }
        }
        Commands::Score {
            quiz,
            answers,
            json,
            tsv,
        } => {
            let quiz = load_valid_quiz(&quiz);
            let answers = match read_answers(&answers) {
                Ok(a) => a,
                Err(e) => exit_with(EXIT_INPUT, format!("Answers error: {:#}", e)),
            };

            let score = score_submission(&quiz.scoring_questions(), &answers);

            if json {
                match serde_json::to_string_pretty(&score) {
                    Ok(s) => println!("{}", s),
                    Err(e) => exit_with(EXIT_INPUT, format!("Failed to serialize score: {}", e)),
                }
            } else if tsv {
                println!("{}", output::format_tsv(&quiz, &score));
            } else {
                println!("{}", output::format_question_table(&quiz, &score, use_colors, false));
                println!();
                println!("Score: {}", output::format_summary(&score, use_colors));
            }
        }
        Commands::Start { quiz, name, email } => {
            let quiz = load_valid_quiz(&quiz);
            let path = store_path(cli.store);
            let mut store = load_store_or_exit(&path);

            let now = Utc::now();
            let sub = match Submission::start(&quiz, name, email, now) {
                Ok(s) => s,
                Err(e) => exit_with(EXIT_SUBMISSION, format!("Cannot start: {:#}", e)),
            };
            let id = sub.id.clone();
            if let Err(e) = store.insert(&quiz, sub) {
                exit_with(EXIT_SUBMISSION, format!("Cannot start: {:#}", e));
            }
            save_store_or_exit(&path, &store);

            println!("{}", id);
            if let Ok(Some(limit)) = quiz.time_limit() {
                eprintln!("Time limit: {}", humantime::format_duration(limit));
            }
        }
        Commands::Submit {
            quiz,
            submission_id,
            answers,
            json,
        } => {
            let quiz = load_valid_quiz(&quiz);
            let answers = match read_answers(&answers) {
                Ok(a) => a,
                Err(e) => exit_with(EXIT_INPUT, format!("Answers error: {:#}", e)),
            };
            let path = store_path(cli.store);
            let mut store = load_store_or_exit(&path);

            let sub = match store.get_mut(&submission_id) {
                Some(s) => s,
                None => exit_with(
                    EXIT_SUBMISSION,
                    format!("Submission {} not found in {}", submission_id, path.display()),
                ),
            };
            let now = Utc::now();
            if let Ok(Some(0)) = sub.seconds_remaining(&quiz, now) {
                eprintln!(
                    "Warning: submission {} arrived with no time left and is still scored",
                    submission_id
                );
            }
            let score = match sub.finalize(&quiz, answers, now) {
                Ok(s) => s.clone(),
                Err(e) => exit_with(EXIT_SUBMISSION, format!("Cannot submit: {:#}", e)),
            };
            save_store_or_exit(&path, &store);

            if json {
                let body = serde_json::json!({
                    "submission_id": submission_id,
                    "total_score": score.total_score,
                    "max_possible_score": score.max_possible_score,
                    "per_question": score.per_question,
                });
                match serde_json::to_string_pretty(&body) {
                    Ok(s) => println!("{}", s),
                    Err(e) => exit_with(EXIT_INPUT, format!("Failed to serialize score: {}", e)),
                }
            } else {
                println!(
                    "{}",
                    output::format_question_table(&quiz, &score, use_colors, quiz.show_answers_after)
                );
                println!();
                println!("Score: {}", output::format_summary(&score, use_colors));
            }
        }
        Commands::Export { quiz, out } => {
            let quiz = load_valid_quiz(&quiz);
            let path = store_path(cli.store);
            let store = load_store_or_exit(&path);

            let submissions = store.for_quiz(quiz.key());
            let csv = match output::build_results_csv(&quiz, &submissions) {
                Ok(c) => c,
                Err(e) => exit_with(EXIT_INPUT, format!("Export error: {:#}", e)),
            };

            match out {
                Some(out) => {
                    let target = if out.is_dir() {
                        out.join(output::export_file_name(&quiz))
                    } else {
                        out
                    };
                    if let Err(e) = output::write_csv(&target, &csv) {
                        exit_with(EXIT_INPUT, format!("Export error: {:#}", e));
                    }
                    eprintln!(
                        "Exported {} submissions to {}",
                        submissions.len(),
                        target.display()
                    );
                }
                None => print!("{}", csv),
            }
        }
        Commands::ShareCode { length, quizzes } => {
            let code = match length {
                Some(len) => share_code::generate_share_code(len),
                None => {
                    let path = store_path(cli.store);
                    let store = load_store_or_exit(&path);
                    let mut taken = Vec::new();
                    for quiz_path in &quizzes {
                        match quiz::load_quiz(quiz_path) {
                            Ok(q) => taken.extend(q.share_code),
                            Err(e) => exit_with(EXIT_QUIZ, format!("Quiz error: {:#}", e)),
                        }
                    }
                    share_code::generate_unique_share_code(
                        |code| store.has_quiz_code(code) || taken.iter().any(|t| t == code),
                        share_code::DEFAULT_MAX_ATTEMPTS,
                    )
                }
            };
            println!("{}", code);
        }
    }

    std::process::exit(EXIT_SUCCESS);
}
