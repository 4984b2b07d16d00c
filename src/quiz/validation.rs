use std::collections::HashSet;

use super::schema::Quiz;
use crate::share_code::is_valid_share_code;

/// Validate a quiz definition before it is used for grading.
/// Returns all validation errors at once (not just the first).
///
/// A question without any correct option is not an error here: it scores
/// full credit. See [`Quiz::zero_correct_questions`].
pub fn validate_quiz(quiz: &Quiz) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if quiz.title.trim().is_empty() {
        errors.push("title: must not be empty".to_string());
    }

    if quiz.questions.is_empty() {
        errors.push("questions: quiz has no questions".to_string());
    }

    // Validate time limit syntax
    if let Some(ref limit) = quiz.time_limit {
        match humantime::parse_duration(limit.trim()) {
            Ok(d) if d.is_zero() => {
                errors.push(format!("time_limit: '{}' must be longer than zero", limit));
            }
            Ok(_) => {}
            Err(e) => errors.push(format!("time_limit: invalid format '{}' - {}", limit, e)),
        }
    }

    if let (Some(opens), Some(closes)) = (quiz.opens_at, quiz.closes_at) {
        if opens >= closes {
            errors.push(format!(
                "opens_at: {} must be before closes_at {}",
                opens.to_rfc3339(),
                closes.to_rfc3339()
            ));
        }
    }

    if let Some(ref code) = quiz.share_code {
        if !is_valid_share_code(code) {
            errors.push(format!(
                "share_code: '{}' may only use A-Z and 2-9, without O or I",
                code
            ));
        }
    }

    let mut question_ids = HashSet::new();
    for (i, question) in quiz.questions.iter().enumerate() {
        if question.id.trim().is_empty() {
            errors.push(format!("questions[{}].id: must not be empty", i));
        } else if !question_ids.insert(question.id.as_str()) {
            errors.push(format!("questions[{}].id: duplicate id '{}'", i, question.id));
        }

        if !question.points.is_finite() || question.points < 0.0 {
            errors.push(format!(
                "questions[{}].points: must be a non-negative number, got {}",
                i, question.points
            ));
        }

        if question.options.is_empty() {
            errors.push(format!("questions[{}].options: question has no options", i));
        }

        let mut option_ids = HashSet::new();
        for (j, option) in question.options.iter().enumerate() {
            if option.id.trim().is_empty() {
                errors.push(format!("questions[{}].options[{}].id: must not be empty", i, j));
            } else if !option_ids.insert(option.id.as_str()) {
                errors.push(format!(
                    "questions[{}].options[{}].id: duplicate id '{}'",
                    i, j, option.id
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
