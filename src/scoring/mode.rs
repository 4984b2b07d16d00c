use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Policy that turns partial correctness of a multi-select question into points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Credit proportional to the fraction of correct options selected.
    /// Wrong selections are ignored.
    #[default]
    ProportionalNoPenalty,
    /// Each wrong selection cancels one correct one. Floored at zero.
    ProportionalWithPenalty,
    /// Full credit only for an exact match.
    AllOrNothing,
}

impl ScoringMode {
    pub const ALL: [ScoringMode; 3] = [
        ScoringMode::ProportionalNoPenalty,
        ScoringMode::ProportionalWithPenalty,
        ScoringMode::AllOrNothing,
    ];

    /// Effective mode for a question: its own override, else the quiz default.
    pub fn resolve(question_override: Option<ScoringMode>, quiz_default: ScoringMode) -> Self {
        question_override.unwrap_or(quiz_default)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringMode::ProportionalNoPenalty => "proportional_no_penalty",
            ScoringMode::ProportionalWithPenalty => "proportional_with_penalty",
            ScoringMode::AllOrNothing => "all_or_nothing",
        }
    }
}

impl fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match ScoringMode::ALL.iter().find(|mode| mode.as_str() == s) {
            Some(mode) => Ok(*mode),
            None => bail!(
                "Unknown scoring mode '{}' (expected one of: proportional_no_penalty, proportional_with_penalty, all_or_nothing)",
                s
            ),
        }
    }
}
