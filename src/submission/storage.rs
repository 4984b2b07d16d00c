use anyhow::{bail, Context, Result};
use atomic_write_file::AtomicWriteFile;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use super::types::Submission;
use crate::quiz::Quiz;

pub const STORE_VERSION: u32 = 1;

/// All recorded submissions, persisted as one JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionStore {
    pub version: u32,
    #[serde(default)]
    pub submissions: Vec<Submission>,
}

impl Default for SubmissionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionStore {
    pub fn new() -> Self {
        Self {
            version: STORE_VERSION,
            submissions: Vec::new(),
        }
    }

    /// Record a new attempt.
    ///
    /// Unless the quiz allows retakes, a second attempt from the same email
    /// address is refused. Attempts without an email cannot be matched and
    /// are always accepted.
    pub fn insert(&mut self, quiz: &Quiz, submission: Submission) -> Result<()> {
        if self.submissions.iter().any(|s| s.id == submission.id) {
            bail!("Submission {} already exists", submission.id);
        }

        if !quiz.allow_retake {
            if let Some(ref email) = submission.student_email {
                let taken = self.submissions.iter().any(|s| {
                    s.quiz_code == submission.quiz_code
                        && s.student_email
                            .as_deref()
                            .is_some_and(|e| e.eq_ignore_ascii_case(email))
                });
                if taken {
                    bail!("{} has already taken quiz '{}'", email, quiz.title);
                }
            }
        }

        self.submissions.push(submission);
        Ok(())
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Submission> {
        self.submissions.iter_mut().find(|s| s.id == id)
    }

    /// Whether any stored submission, finalized or not, belongs to this quiz.
    pub fn has_quiz_code(&self, quiz_code: &str) -> bool {
        self.submissions.iter().any(|s| s.quiz_code == quiz_code)
    }

    /// Finalized submissions for a quiz, oldest submission first.
    pub fn for_quiz(&self, quiz_code: &str) -> Vec<&Submission> {
        let mut subs: Vec<&Submission> = self
            .submissions
            .iter()
            .filter(|s| s.quiz_code == quiz_code && s.is_submitted())
            .collect();
        subs.sort_by_key(|s| s.submitted_at);
        subs
    }
}

/// Default store path (~/.config/quiz-grade/submissions.json)
pub fn default_store_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("quiz-grade").join("submissions.json"))
}

/// Load the store from a JSON file
///
/// If the file doesn't exist, returns a new empty store.
/// If the file exists but has an unsupported version, returns an error.
pub fn load_store(path: &Path) -> Result<SubmissionStore> {
    if !path.exists() {
        return Ok(SubmissionStore::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open submission store at {}", path.display()))?;

    let store: SubmissionStore =
        serde_json::from_reader(file).context("Failed to load submission store")?;

    if store.version != STORE_VERSION {
        bail!("Unsupported submission store version: {}", store.version);
    }

    Ok(store)
}

/// Save the store to a JSON file atomically
///
/// The file is never left half-written. Missing parent directories are created.
pub fn save_store(path: &Path, store: &SubmissionStore) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory at {}", parent.display()))?;
        }
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, store).context("Failed to serialize submission store")?;

    file.commit().context("Failed to save submission store")?;

    Ok(())
}
