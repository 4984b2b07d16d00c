use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

use super::mode::ScoringMode;

/// One answer option as the engine sees it. Display fields live elsewhere.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnswerOption {
    pub id: String,
    pub is_correct: bool,
}

impl AnswerOption {
    pub fn new(id: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id: id.into(),
            is_correct,
        }
    }
}

/// Everything needed to score a single question.
#[derive(Debug, Clone)]
pub struct QuestionInput<'a> {
    pub points: f64,
    pub scoring_mode: ScoringMode,
    pub all_options: &'a [AnswerOption],
    pub selected_option_ids: HashSet<&'a str>,
}

impl<'a> QuestionInput<'a> {
    /// Build an input from any selection list. Duplicate ids collapse.
    pub fn new<I>(
        points: f64,
        scoring_mode: ScoringMode,
        all_options: &'a [AnswerOption],
        selected: I,
    ) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            points,
            scoring_mode,
            all_options,
            selected_option_ids: selected.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QuestionScore {
    pub earned: f64,
    pub max: f64,
    pub correct_count: usize,
    pub total_correct: usize,
}

/// Per-question scoring configuration, with the scoring mode already resolved.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QuestionSpec {
    pub id: String,
    pub points: f64,
    pub scoring_mode: ScoringMode,
    pub all_options: Vec<AnswerOption>,
}

/// A student's selections for one question.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Answer {
    pub question_id: String,
    #[serde(default)]
    pub selected_option_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SubmissionScore {
    pub total_score: f64,
    pub max_possible_score: f64,
    pub per_question: BTreeMap<String, QuestionScore>,
}

impl SubmissionScore {
    /// Whole-number percentage, 0 when nothing was attainable.
    pub fn percentage(&self) -> u32 {
        percentage(self.total_score, self.max_possible_score)
    }
}

pub fn percentage(total: f64, max: f64) -> u32 {
    if max > 0.0 {
        ((total / max) * 100.0).round().max(0.0) as u32
    } else {
        0
    }
}

/// Round to cents: x100, nearest integer (halves up), /100.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn score_question(input: &QuestionInput) -> QuestionScore {
    let points = input.points;
    let total_correct = input.all_options.iter().filter(|o| o.is_correct).count();

    // No correct option configured: full credit. Kept as a product decision.
    if total_correct == 0 {
        return QuestionScore {
            earned: points,
            max: points,
            correct_count: 0,
            total_correct: 0,
        };
    }

    let mut correct_selected = 0usize;
    let mut wrong_selected = 0usize;
    for option in input.all_options {
        if input.selected_option_ids.contains(option.id.as_str()) {
            if option.is_correct {
                correct_selected += 1;
            } else {
                wrong_selected += 1;
            }
        }
    }

    let n = total_correct as f64;
    let earned = match input.scoring_mode {
        ScoringMode::ProportionalNoPenalty => (correct_selected as f64 / n) * points,
        ScoringMode::ProportionalWithPenalty => {
            let net = correct_selected as f64 - wrong_selected as f64;
            // A zero-point question would otherwise yield -0.0
            if net <= 0.0 {
                0.0
            } else {
                (net / n) * points
            }
        }
        ScoringMode::AllOrNothing => {
            if correct_selected == total_correct && wrong_selected == 0 {
                points
            } else {
                0.0
            }
        }
    };

    QuestionScore {
        earned: round_cents(earned),
        max: points,
        correct_count: correct_selected,
        total_correct,
    }
}

pub fn score_submission(questions: &[QuestionSpec], answers: &[Answer]) -> SubmissionScore {
    // Later entries overwrite earlier ones for the same question id.
    let selections: HashMap<&str, &[String]> = answers
        .iter()
        .map(|a| (a.question_id.as_str(), a.selected_option_ids.as_slice()))
        .collect();

    let mut total_score = 0.0;
    let mut max_possible_score = 0.0;
    let mut per_question = BTreeMap::new();

    for question in questions {
        let selected = selections.get(question.id.as_str()).copied().unwrap_or(&[]);
        let input = QuestionInput::new(
            question.points,
            question.scoring_mode,
            &question.all_options,
            selected.iter().map(String::as_str),
        );
        let result = score_question(&input);

        if result.total_correct == 0 {
            warn!(
                question = %question.id,
                "question has no correct option configured, awarding full credit"
            );
        }
        debug!(
            question = %question.id,
            mode = %question.scoring_mode,
            earned = result.earned,
            max = result.max,
            "scored question"
        );

        total_score += result.earned;
        max_possible_score += result.max;
        per_question.insert(question.id.clone(), result);
    }

    SubmissionScore {
        total_score: round_cents(total_score),
        max_possible_score: round_cents(max_possible_score),
        per_question,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(flags: &[(&str, bool)]) -> Vec<AnswerOption> {
        flags
            .iter()
            .map(|(id, correct)| AnswerOption::new(*id, *correct))
            .collect()
    }

    fn score(points: f64, mode: ScoringMode, all: &[AnswerOption], selected: &[&str]) -> QuestionScore {
        let input = QuestionInput::new(points, mode, all, selected.iter().copied());
        score_question(&input)
    }

    fn spec(id: &str, points: f64, mode: ScoringMode, all: Vec<AnswerOption>) -> QuestionSpec {
        QuestionSpec {
            id: id.to_string(),
            points,
            scoring_mode: mode,
            all_options: all,
        }
    }

    fn answer(question_id: &str, selected: &[&str]) -> Answer {
        Answer {
            question_id: question_id.to_string(),
            selected_option_ids: selected.iter().map(|s| s.to_string()).collect(),
        }
    }

    // Product decision: a question without any correct option pays out in full
    // under every mode. Tests pin the behavior rather than endorse it.
    #[test]
    fn test_zero_correct_options_awards_full_credit() {
        for mode in ScoringMode::ALL {
            let result = score(5.0, mode, &[], &[]);
            assert_eq!(
                result,
                QuestionScore {
                    earned: 5.0,
                    max: 5.0,
                    correct_count: 0,
                    total_correct: 0,
                }
            );
        }
    }

    #[test]
    fn test_zero_correct_with_wrong_picks_still_full_credit() {
        let all = options(&[("a", false), ("b", false)]);
        let result = score(3.0, ScoringMode::AllOrNothing, &all, &["a", "b"]);
        assert_eq!(result.earned, 3.0);
        assert_eq!(result.total_correct, 0);
    }

    #[test]
    fn test_no_penalty_correct_only() {
        let all = options(&[("a", true), ("b", false)]);
        let result = score(10.0, ScoringMode::ProportionalNoPenalty, &all, &["a"]);
        assert_eq!(result.earned, 10.0);
        assert_eq!(result.correct_count, 1);
        assert_eq!(result.total_correct, 1);
    }

    #[test]
    fn test_no_penalty_ignores_wrong_pick() {
        let all = options(&[("a", true), ("b", false)]);
        let result = score(10.0, ScoringMode::ProportionalNoPenalty, &all, &["a", "b"]);
        assert_eq!(result.earned, 10.0);
    }

    #[test]
    fn test_no_penalty_partial_credit() {
        let all = options(&[("a", true), ("b", true), ("c", false), ("d", false)]);
        let result = score(10.0, ScoringMode::ProportionalNoPenalty, &all, &["b"]);
        assert_eq!(result.earned, 5.0);
        assert_eq!(result.correct_count, 1);
        assert_eq!(result.total_correct, 2);
    }

    #[test]
    fn test_penalty_cancels_correct_pick() {
        let all = options(&[("a", true), ("b", true), ("c", false), ("d", false)]);
        let result = score(10.0, ScoringMode::ProportionalWithPenalty, &all, &["a", "c"]);
        assert_eq!(result.earned, 0.0);
        assert_eq!(result.correct_count, 1);
    }

    #[test]
    fn test_penalty_all_correct() {
        let all = options(&[("a", true), ("b", true), ("c", false), ("d", false)]);
        let result = score(10.0, ScoringMode::ProportionalWithPenalty, &all, &["a", "b"]);
        assert_eq!(result.earned, 10.0);
    }

    #[test]
    fn test_penalty_floors_at_zero() {
        let all = options(&[("a", true), ("b", false), ("c", false)]);
        let result = score(6.0, ScoringMode::ProportionalWithPenalty, &all, &["b", "c"]);
        assert_eq!(result.earned, 0.0);
        assert!(result.earned >= 0.0);
    }

    #[test]
    fn test_penalty_partial_net_credit() {
        let all = options(&[("a", true), ("b", true), ("c", true), ("d", false)]);
        // (3 - 1) / 3 * 9 = 6
        let result = score(9.0, ScoringMode::ProportionalWithPenalty, &all, &["a", "b", "c", "d"]);
        assert_eq!(result.earned, 6.0);
    }

    #[test]
    fn test_all_or_nothing_exact_match() {
        let all = options(&[("a", true), ("b", true), ("c", false)]);
        let result = score(4.0, ScoringMode::AllOrNothing, &all, &["a", "b"]);
        assert_eq!(result.earned, 4.0);
    }

    #[test]
    fn test_all_or_nothing_with_wrong_pick() {
        let all = options(&[("a", true), ("b", true), ("c", false)]);
        let result = score(4.0, ScoringMode::AllOrNothing, &all, &["a", "c"]);
        assert_eq!(result.earned, 0.0);
    }

    #[test]
    fn test_all_or_nothing_missing_correct_pick() {
        let all = options(&[("a", true), ("b", true), ("c", false)]);
        let result = score(4.0, ScoringMode::AllOrNothing, &all, &["a"]);
        assert_eq!(result.earned, 0.0);
        assert_eq!(result.correct_count, 1);
    }

    #[test]
    fn test_all_or_nothing_superset_fails() {
        let all = options(&[("a", true), ("b", true), ("c", false)]);
        let result = score(4.0, ScoringMode::AllOrNothing, &all, &["a", "b", "c"]);
        assert_eq!(result.earned, 0.0);
    }

    #[test]
    fn test_rounds_to_cents() {
        let all = options(&[("a", true), ("b", true), ("c", true)]);
        let one = score(10.0, ScoringMode::ProportionalNoPenalty, &all, &["a"]);
        assert_eq!(one.earned, 3.33);

        let two = score(10.0, ScoringMode::ProportionalNoPenalty, &all, &["a", "b"]);
        assert_eq!(two.earned, 6.67);
    }

    #[test]
    fn test_rounds_half_cent_up() {
        let all = options(&[
            ("a", true),
            ("b", true),
            ("c", true),
            ("d", true),
            ("e", true),
            ("f", true),
            ("g", true),
            ("h", true),
        ]);
        // 1/8 of a point is 12.5 cents
        let result = score(1.0, ScoringMode::ProportionalNoPenalty, &all, &["a"]);
        assert_eq!(result.earned, 0.13);
    }

    #[test]
    fn test_penalty_zero_points_is_positive_zero() {
        let all = options(&[("a", true), ("b", false)]);
        let result = score(0.0, ScoringMode::ProportionalWithPenalty, &all, &["b"]);
        assert_eq!(result.earned, 0.0);
        assert!(result.earned.is_sign_positive());

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"earned\":0.0"));
        assert!(!json.contains("-0.0"));
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let all = options(&[("a", true), ("b", false)]);
        let result = score(2.0, ScoringMode::ProportionalWithPenalty, &all, &["zzz", "a"]);
        assert_eq!(result.earned, 2.0);
        assert_eq!(result.correct_count, 1);
    }

    #[test]
    fn test_duplicate_selections_collapse() {
        let all = options(&[("a", true), ("b", true)]);
        let result = score(10.0, ScoringMode::ProportionalNoPenalty, &all, &["a", "a", "a"]);
        assert_eq!(result.earned, 5.0);
        assert_eq!(result.correct_count, 1);
    }

    #[test]
    fn test_empty_selection_scores_zero() {
        let all = options(&[("a", true), ("b", false)]);
        for mode in ScoringMode::ALL {
            let result = score(7.0, mode, &all, &[]);
            assert_eq!(result.earned, 0.0);
            assert_eq!(result.max, 7.0);
        }
    }

    #[test]
    fn test_earned_within_bounds_for_every_selection() {
        let all = options(&[("a", true), ("b", true), ("c", false), ("d", false)]);
        let ids = ["a", "b", "c", "d"];
        for mask in 0u8..16 {
            let selected: Vec<&str> = ids
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1u8 << *i) != 0)
                .map(|(_, id)| *id)
                .collect();
            for mode in ScoringMode::ALL {
                let result = score(10.0, mode, &all, &selected);
                assert!(result.earned >= 0.0, "{:?} {:?}", mode, selected);
                assert!(result.earned <= result.max, "{:?} {:?}", mode, selected);
                assert!(result.correct_count <= result.total_correct);
                assert!(result.correct_count <= selected.len());
            }
        }
    }

    #[test]
    fn test_submission_totals() {
        let questions = vec![
            spec("q1", 10.0, ScoringMode::ProportionalNoPenalty, options(&[("a", true), ("b", false)])),
            spec(
                "q2",
                4.0,
                ScoringMode::AllOrNothing,
                options(&[("c", true), ("d", true), ("e", false)]),
            ),
        ];
        let answers = vec![answer("q1", &["a"]), answer("q2", &["c"])];

        let result = score_submission(&questions, &answers);
        assert_eq!(result.total_score, 10.0);
        assert_eq!(result.max_possible_score, 14.0);
        assert_eq!(result.per_question.len(), 2);
        assert_eq!(result.per_question["q2"].earned, 0.0);
        assert_eq!(result.percentage(), 71);
    }

    #[test]
    fn test_submission_missing_answer_scores_empty_selection() {
        let questions = vec![
            spec("q1", 10.0, ScoringMode::ProportionalNoPenalty, options(&[("a", true)])),
            spec("q2", 5.0, ScoringMode::ProportionalNoPenalty, options(&[("b", true)])),
        ];
        let answers = vec![answer("q1", &["a"])];

        let result = score_submission(&questions, &answers);
        let q2 = &result.per_question["q2"];
        assert_eq!(q2.earned, 0.0);
        assert_eq!(q2.correct_count, 0);
        assert_eq!(q2.total_correct, 1);
        assert_eq!(result.total_score, 10.0);
        assert_eq!(result.max_possible_score, 15.0);
    }

    #[test]
    fn test_submission_duplicate_answer_last_wins() {
        let questions = vec![spec(
            "q1",
            10.0,
            ScoringMode::ProportionalNoPenalty,
            options(&[("a", true), ("b", false)]),
        )];
        let answers = vec![answer("q1", &["a"]), answer("q1", &["b"])];

        let result = score_submission(&questions, &answers);
        assert_eq!(result.per_question["q1"].earned, 0.0);
    }

    #[test]
    fn test_submission_answers_for_unknown_questions_ignored() {
        let questions = vec![spec("q1", 2.0, ScoringMode::AllOrNothing, options(&[("a", true)]))];
        let answers = vec![answer("nope", &["a"]), answer("q1", &["a"])];

        let result = score_submission(&questions, &answers);
        assert_eq!(result.per_question.len(), 1);
        assert_eq!(result.total_score, 2.0);
    }

    #[test]
    fn test_submission_is_deterministic() {
        let questions = vec![
            spec(
                "q1",
                10.0,
                ScoringMode::ProportionalWithPenalty,
                options(&[("a", true), ("b", true), ("c", true), ("d", false)]),
            ),
            spec("q2", 3.0, ScoringMode::ProportionalNoPenalty, options(&[("e", true), ("f", true)])),
        ];
        let answers = vec![answer("q2", &["f"]), answer("q1", &["a", "d", "b"])];

        let first = score_submission(&questions, &answers);
        let second = score_submission(&questions, &answers);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_submission_sum_property() {
        let questions = vec![
            spec("q1", 10.0, ScoringMode::ProportionalNoPenalty, options(&[("a", true), ("b", true), ("c", true)])),
            spec("q2", 10.0, ScoringMode::ProportionalNoPenalty, options(&[("d", true), ("e", true), ("f", true)])),
            spec("q3", 1.5, ScoringMode::ProportionalWithPenalty, options(&[("g", true), ("h", false)])),
        ];
        let answers = vec![
            answer("q1", &["a"]),
            answer("q2", &["d", "e"]),
            answer("q3", &["g"]),
        ];

        let result = score_submission(&questions, &answers);
        let earned: f64 = result.per_question.values().map(|q| q.earned).sum();
        let max: f64 = result.per_question.values().map(|q| q.max).sum();
        assert_eq!(result.total_score, round_cents(earned));
        assert_eq!(result.max_possible_score, round_cents(max));
        // 3.33 + 6.67 + 1.5
        assert_eq!(result.total_score, 11.5);
    }

    #[test]
    fn test_empty_submission() {
        let result = score_submission(&[], &[]);
        assert_eq!(result.total_score, 0.0);
        assert_eq!(result.max_possible_score, 0.0);
        assert!(result.per_question.is_empty());
        assert_eq!(result.percentage(), 0);
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(1.0, 3.0), 33);
        assert_eq!(percentage(2.0, 3.0), 67);
        assert_eq!(percentage(5.0, 0.0), 0);
    }
}
