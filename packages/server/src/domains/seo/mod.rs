//! SEO dashboard domain: keyword analytics and related-post enrichment.

pub mod actions;
pub mod data;
pub mod sources;
pub mod store;

pub use actions::{detailed_job_result, send_chat_message};
pub use data::*;
pub use sources::{RelatedPostSource, RelatedPostSources, SourceError};
pub use store::DashboardState;
