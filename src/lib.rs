pub mod output;
pub mod quiz;
pub mod schedule;
pub mod scoring;
pub mod share_code;
pub mod submission;
