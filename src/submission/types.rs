use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::quiz::Quiz;
use crate::schedule;
use crate::scoring::{score_submission, Answer, SubmissionScore};

/// One student's attempt at a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    /// [`Quiz::key`] of the quiz this attempt belongs to
    pub quiz_code: String,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub student_email: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub score: Option<SubmissionScore>,
}

fn new_submission_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();
    format!("sub_{}", suffix)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Submission {
    /// Open a new attempt. Fails if the quiz is outside its window or a
    /// required identity field is missing.
    pub fn start(
        quiz: &Quiz,
        student_name: Option<String>,
        student_email: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if !schedule::is_open(quiz.opens_at, quiz.closes_at, now) {
            bail!("Quiz '{}' is not open for submissions", quiz.title);
        }

        let student_name = non_blank(student_name);
        let student_email = non_blank(student_email);
        if quiz.require_name && student_name.is_none() {
            bail!("Quiz '{}' requires a student name", quiz.title);
        }
        if quiz.require_email && student_email.is_none() {
            bail!("Quiz '{}' requires a student email", quiz.title);
        }

        Ok(Self {
            id: new_submission_id(),
            quiz_code: quiz.key().to_string(),
            student_name,
            student_email,
            started_at: now,
            submitted_at: None,
            answers: Vec::new(),
            score: None,
        })
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }

    /// Seconds left on the quiz's time limit, counted from `started_at`.
    /// `None` when the quiz has no limit.
    pub fn seconds_remaining(&self, quiz: &Quiz, now: DateTime<Utc>) -> Result<Option<u64>> {
        Ok(quiz
            .time_limit()?
            .map(|limit| schedule::seconds_remaining(self.started_at, limit, now)))
    }

    /// Score and close this attempt. A submission is finalized at most once.
    ///
    /// Running past the time limit is logged but still scored: the student's
    /// client has already forced the submission at that point.
    pub fn finalize(
        &mut self,
        quiz: &Quiz,
        answers: Vec<Answer>,
        now: DateTime<Utc>,
    ) -> Result<&SubmissionScore> {
        if let Some(at) = self.submitted_at {
            bail!(
                "Submission {} was already submitted at {}",
                self.id,
                at.to_rfc3339()
            );
        }
        if self.quiz_code != quiz.key() {
            bail!(
                "Submission {} belongs to quiz '{}', not '{}'",
                self.id,
                self.quiz_code,
                quiz.key()
            );
        }

        if let Some(limit) = quiz.time_limit()? {
            if schedule::time_limit_exceeded(self.started_at, limit, now) {
                warn!(
                    submission = %self.id,
                    limit = %humantime::format_duration(limit),
                    "submission exceeded time limit"
                );
            }
        }

        let score = score_submission(&quiz.scoring_questions(), &answers);
        info!(
            submission = %self.id,
            total = score.total_score,
            max = score.max_possible_score,
            "submission scored"
        );

        self.answers = answers;
        self.submitted_at = Some(now);
        Ok(&*self.score.insert(score))
    }
}
