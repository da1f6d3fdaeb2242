//! Transcription domain: pipelines, analysis, and chat commands.

pub mod analyze;
pub mod chat;
pub mod data;
pub mod pipeline;
pub mod transcribe;
pub mod youtube;

pub use chat::{orchestrate_user_request, parse_intent, Intent, Orchestration};
pub use data::*;
pub use pipeline::{stage_table, ProgressReporter};
pub use transcribe::{analyze_text, transcribe_file, transcribe_video};
