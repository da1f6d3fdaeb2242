//! Diagnostic persistence of raw model replies.
//!
//! When structure recovery fails (or misbehaves in ways only visible later),
//! the raw reply and its fence-stripped form are the evidence. Saving them
//! is strictly best-effort: persistence errors are logged and swallowed so
//! the main extraction path can never block or fail on diagnostics.

use std::path::Path;

use tracing::{debug, warn};

use super::extract::strip_code_fences;

/// Save a raw model reply and its cleaned variant to a timestamped file
/// under `dir`. A `None` directory disables persistence entirely.
pub async fn save_raw_model_reply(dir: Option<&Path>, helper_name: &str, reply: &str) {
    let Some(dir) = dir else {
        return;
    };

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("{timestamp}__{helper_name}.log"));

    let body = format!(
        "--- RAW RESPONSE ---\n{}\n\n--- CLEANED (strip fences) ---\n{}\n",
        reply,
        strip_code_fences(reply)
    );

    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!(error = %e, dir = %dir.display(), "Failed to create raw reply log dir");
        return;
    }
    match tokio::fs::write(&path, body).await {
        Ok(()) => debug!(path = %path.display(), "Saved raw model reply"),
        Err(e) => warn!(error = %e, path = %path.display(), "Failed to save raw model reply"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_when_no_dir() {
        // Must be a silent no-op.
        save_raw_model_reply(None, "summary", "{}").await;
    }

    #[tokio::test]
    async fn test_writes_raw_and_cleaned_sections() {
        let dir = std::env::temp_dir().join(format!("raw-log-test-{}", uuid::Uuid::new_v4()));
        save_raw_model_reply(Some(&dir), "summary", "```json\n{\"a\":1}\n```").await;

        let mut entries = tokio::fs::read_dir(&dir).await.unwrap();
        let entry = entries.next_entry().await.unwrap().unwrap();
        let content = tokio::fs::read_to_string(entry.path()).await.unwrap();

        assert!(content.contains("--- RAW RESPONSE ---"));
        assert!(content.contains("```json"));
        assert!(content.contains("--- CLEANED (strip fences) ---"));
        assert!(content.contains("{\"a\":1}"));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_unwritable_dir_does_not_propagate() {
        // /proc is not writable; the call must still return normally.
        save_raw_model_reply(Some(Path::new("/proc/raw-log-test")), "x", "y").await;
    }
}
