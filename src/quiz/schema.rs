use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::scoring::{AnswerOption, QuestionSpec, ScoringMode};

/// A quiz definition as written by its author.
///
/// Example YAML:
/// ```yaml
/// title: Cell biology
/// scoring_mode: proportional_with_penalty
/// time_limit: 30m
/// share_code: K7QX2MA
/// questions:
///   - id: q1
///     text: Which organelles contain DNA?
///     points: 10
///     options:
///       - { id: a, text: Nucleus, is_correct: true }
///       - { id: b, text: Mitochondria, is_correct: true }
///       - { id: c, text: Ribosome }
///   - id: q2
///     text: Pick the prokaryote.
///     points: 4
///     scoring_mode: all_or_nothing
///     options:
///       - { id: d, text: E. coli, is_correct: true }
///       - { id: e, text: Yeast }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Quiz {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Default policy for questions without their own `scoring_mode`
    #[serde(default)]
    pub scoring_mode: ScoringMode,

    /// Humantime duration, e.g. "30m" or "1h 15m"
    #[serde(default)]
    pub time_limit: Option<String>,

    #[serde(default)]
    pub opens_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub closes_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub share_code: Option<String>,

    #[serde(default)]
    pub require_name: bool,

    #[serde(default)]
    pub require_email: bool,

    /// Reveal correct options once a submission is finalized
    #[serde(default)]
    pub show_answers_after: bool,

    #[serde(default)]
    pub allow_retake: bool,

    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Question {
    pub id: String,

    pub text: String,

    pub points: f64,

    /// None inherits the quiz default
    #[serde(default)]
    pub scoring_mode: Option<ScoringMode>,

    #[serde(default)]
    pub options: Vec<QuizOption>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct QuizOption {
    pub id: String,

    pub text: String,

    #[serde(default)]
    pub is_correct: bool,
}

/// Student-facing question. Carries no correctness flags.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuestionPublic {
    pub id: String,
    pub text: String,
    pub points: f64,
    /// How many options are correct; a form uses it to cap selections.
    pub correct_count: usize,
    pub scoring_mode: Option<ScoringMode>,
    pub options: Vec<OptionPublic>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OptionPublic {
    pub id: String,
    pub text: String,
}

impl Question {
    pub fn correct_count(&self) -> usize {
        self.options.iter().filter(|o| o.is_correct).count()
    }

    pub fn correct_options(&self) -> impl Iterator<Item = &QuizOption> {
        self.options.iter().filter(|o| o.is_correct)
    }
}

impl Quiz {
    /// Key that ties submissions to this quiz: the share code, else the title.
    pub fn key(&self) -> &str {
        self.share_code.as_deref().unwrap_or(&self.title)
    }

    pub fn effective_mode(&self, question: &Question) -> ScoringMode {
        ScoringMode::resolve(question.scoring_mode, self.scoring_mode)
    }

    /// Engine inputs, with each question's scoring mode resolved against the
    /// quiz default and correctness taken from this definition.
    pub fn scoring_questions(&self) -> Vec<QuestionSpec> {
        self.questions
            .iter()
            .map(|q| QuestionSpec {
                id: q.id.clone(),
                points: q.points,
                scoring_mode: self.effective_mode(q),
                all_options: q
                    .options
                    .iter()
                    .map(|o| AnswerOption::new(o.id.clone(), o.is_correct))
                    .collect(),
            })
            .collect()
    }

    pub fn public_questions(&self) -> Vec<QuestionPublic> {
        self.questions
            .iter()
            .map(|q| QuestionPublic {
                id: q.id.clone(),
                text: q.text.clone(),
                points: q.points,
                correct_count: q.correct_count(),
                scoring_mode: q.scoring_mode,
                options: q
                    .options
                    .iter()
                    .map(|o| OptionPublic {
                        id: o.id.clone(),
                        text: o.text.clone(),
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn time_limit(&self) -> Result<Option<Duration>> {
        self.time_limit
            .as_deref()
            .map(|s| {
                humantime::parse_duration(s.trim())
                    .with_context(|| format!("Invalid time limit '{}'", s))
            })
            .transpose()
    }

    /// Ids of questions with no correct option. These score full credit.
    pub fn zero_correct_questions(&self) -> Vec<&str> {
        self.questions
            .iter()
            .filter(|q| q.correct_count() == 0)
            .map(|q| q.id.as_str())
            .collect()
    }
}
