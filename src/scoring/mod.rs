pub mod engine;
pub mod mode;

pub use engine::{
    percentage, round_cents, score_question, score_submission, Answer, AnswerOption,
    QuestionInput, QuestionScore, QuestionSpec, SubmissionScore,
};
pub use mode::ScoringMode;
