use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use csv::{Terminator, WriterBuilder};
use std::io::Write;
use std::path::Path;

use super::formatter::format_points;
use crate::quiz::Quiz;
use crate::scoring::percentage;
use crate::submission::Submission;

/// Build the results export for a quiz.
///
/// Header: Student Name, Student Email, one "Q{n} ({points}pts)" column per
/// question in quiz order, Total Score, Max Score, Percentage. Submissions
/// without a score, or without a result for a question, export 0. Every
/// record, the header included, ends with '\n'.
pub fn build_results_csv(quiz: &Quiz, submissions: &[&Submission]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let mut headers = vec!["Student Name".to_string(), "Student Email".to_string()];
    headers.extend(
        quiz.questions
            .iter()
            .enumerate()
            .map(|(i, q)| format!("Q{} ({}pts)", i + 1, format_points(q.points))),
    );
    headers.extend(["Total Score", "Max Score", "Percentage"].map(String::from));
    writer
        .write_record(&headers)
        .context("Failed to write CSV header")?;

    for sub in submissions {
        let (total, max) = sub
            .score
            .as_ref()
            .map(|s| (s.total_score, s.max_possible_score))
            .unwrap_or((0.0, 0.0));

        let mut row = vec![
            sub.student_name.clone().unwrap_or_default(),
            sub.student_email.clone().unwrap_or_default(),
        ];
        row.extend(quiz.questions.iter().map(|q| {
            let earned = sub
                .score
                .as_ref()
                .and_then(|s| s.per_question.get(&q.id))
                .map(|r| r.earned)
                .unwrap_or(0.0);
            format_points(earned)
        }));
        row.push(format_points(total));
        row.push(format_points(max));
        row.push(format!("{}%", percentage(total, max)));

        writer
            .write_record(&row)
            .with_context(|| format!("Failed to write CSV row for submission {}", sub.id))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV export is not valid UTF-8")
}

/// Slug used for export file names: anything but ASCII letters and digits
/// becomes '-'.
pub fn export_file_name(quiz: &Quiz) -> String {
    let slug: String = quiz
        .title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("{}-results.csv", slug)
}

/// Write CSV to a file atomically
pub fn write_csv(path: &Path, csv: &str) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    file.write_all(csv.as_bytes())
        .with_context(|| format!("Failed to write CSV to {}", path.display()))?;

    file.commit().context("Failed to save CSV export")?;

    Ok(())
}
