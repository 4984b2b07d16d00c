pub mod storage;
pub mod types;

pub use storage::{default_store_path, load_store, save_store, SubmissionStore};
pub use types::Submission;
