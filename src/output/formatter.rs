use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::quiz::Quiz;
use crate::scoring::{QuestionScore, SubmissionScore};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format points with at most two decimals, trailing zeros dropped
/// ("10", "3.33", "2.5")
pub fn format_points(points: f64) -> String {
    let formatted = format!("{:.2}", points);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// One-line summary: "13.33 / 20 (67%)"
pub fn format_summary(score: &SubmissionScore, use_colors: bool) -> String {
    let earned = format_points(score.total_score);
    let max = format_points(score.max_possible_score);
    let pct = format!("{}%", score.percentage());

    if use_colors {
        format!("{} / {} ({})", earned.bold(), max, pct.cyan())
    } else {
        format!("{} / {} ({})", earned, max, pct)
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate_text(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn format_ratio(result: &QuestionScore) -> String {
    format!("{}/{}", format_points(result.earned), format_points(result.max))
}

/// Format per-question results as a table in quiz order.
/// Columns: index, earned/max, correct picks, question text. No headers.
///
/// With `reveal_answers`, the texts of the correct options follow each line.
pub fn format_question_table(
    quiz: &Quiz,
    score: &SubmissionScore,
    use_colors: bool,
    reveal_answers: bool,
) -> String {
    if quiz.questions.is_empty() {
        return "No questions in quiz.".to_string();
    }

    let term_width = get_terminal_width();

    // Index: 3 chars, points: 13 chars ("100.25/100.25"), picks: 5 chars
    let index_width = 3;
    let points_width = 13;
    let picks_width = 5;
    let separator = "  ";
    let fixed_width = index_width + 1 + points_width + picks_width + separator.len() * 2;

    quiz.questions
        .iter()
        .enumerate()
        .map(|(idx, question)| {
            let index_str = format!("{:>2}.", idx + 1);
            let (points_str, picks_str, full_marks) = match score.per_question.get(&question.id) {
                Some(result) => (
                    format_ratio(result),
                    format!("{}/{}", result.correct_count, result.total_correct),
                    result.earned >= result.max,
                ),
                None => ("-".to_string(), "-".to_string(), false),
            };
            let points_padded = format!("{:>width$}", points_str, width = points_width);
            let picks_padded = format!("{:>width$}", picks_str, width = picks_width);

            let text = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate_text(&question.text, width - fixed_width)
                }
                // Very narrow terminal, show truncated
                Some(_) => truncate_text(&question.text, 20),
                // No terminal (pipe), don't truncate
                None => question.text.clone(),
            };

            let mut line = if use_colors {
                let points_colored = if full_marks {
                    points_padded.green().to_string()
                } else {
                    points_padded.yellow().to_string()
                };
                format!(
                    "{} {}{}{}{}{}",
                    index_str.dimmed(),
                    points_colored,
                    separator,
                    picks_padded.dimmed(),
                    separator,
                    text
                )
            } else {
                format!(
                    "{} {}{}{}{}{}",
                    index_str, points_padded, separator, picks_padded, separator, text
                )
            };

            if reveal_answers {
                let correct: Vec<&str> = question.correct_options().map(|o| o.text.as_str()).collect();
                let answers = if correct.is_empty() {
                    "(none)".to_string()
                } else {
                    correct.join(", ")
                };
                line.push_str("\n     Answer: ");
                if use_colors {
                    line.push_str(&answers.green().to_string());
                } else {
                    line.push_str(&answers);
                }
            }

            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format per-question results as tab-separated values for scripting
/// Columns: question_id, earned, max (no headers, no colors)
pub fn format_tsv(quiz: &Quiz, score: &SubmissionScore) -> String {
    quiz.questions
        .iter()
        .filter_map(|q| score.per_question.get(&q.id).map(|r| (q, r)))
        .map(|(q, r)| {
            format!(
                "{}\t{}\t{}",
                q.id,
                format_points(r.earned),
                format_points(r.max)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
