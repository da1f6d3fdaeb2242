//! Kernel module - server infrastructure and dependencies.

pub mod cache;
pub mod deps;
pub mod extract;
pub mod gemini;
pub mod jobs;
pub mod progress;
pub mod progress_hub;
pub mod raw_log;
pub mod retry;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use cache::LookupCache;
pub use deps::ServerDeps;
pub use extract::{extract_first_json, strip_code_fences};
pub use gemini::{is_quota_error, GeminiAi};
pub use jobs::{JobError, JobId, JobRegistry, JobSnapshot, JobStatus};
pub use progress::{overall_progress, StageTable};
pub use progress_hub::{ProgressHub, ProgressUpdate, PROGRESS_TOPIC};
pub use raw_log::save_raw_model_reply;
pub use retry::{retry, RetryPolicy};
pub use traits::*;
