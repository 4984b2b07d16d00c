mod schema;
pub mod validation;

pub use schema::{OptionPublic, Question, QuestionPublic, Quiz, QuizOption};
pub use validation::validate_quiz;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Load a quiz definition from a YAML file
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist
/// - The file cannot be read
/// - The YAML cannot be parsed into a quiz
pub fn load_quiz(path: &Path) -> Result<Quiz> {
    if !path.exists() {
        anyhow::bail!("Quiz file not found at {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read quiz file at {}", path.display()))?;

    parse_quiz(&content)
        .with_context(|| format!("Failed to parse quiz: invalid YAML in {}", path.display()))
}

pub fn parse_quiz(yaml: &str) -> Result<Quiz> {
    let quiz: Quiz = serde_saphyr::from_str(yaml)?;
    Ok(quiz)
}
