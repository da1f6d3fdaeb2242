//! In-process pub/sub hub for real-time progress updates.
//!
//! Keeps percentage computation decoupled from the transport that delivers
//! it: pipelines publish [`ProgressUpdate`] values to a topic, and the SSE
//! endpoint subscribes by topic string and forwards them to clients.
//!
//! Producers (pipeline drivers):
//!   hub.publish("progress", ProgressUpdate::overall("Chunking audio...", 25)).await;
//!
//! Consumers (SSE endpoint):
//!   let rx = hub.subscribe("progress").await;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, RwLock};

/// Topic carrying pipeline-wide progress updates.
pub const PROGRESS_TOPIC: &str = "progress";

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    /// Update kind; currently always `overall`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable description of what the pipeline is doing.
    pub status: String,
    /// Cumulative 0–100 completion figure.
    pub percentage: u8,
}

impl ProgressUpdate {
    pub fn overall(status: impl Into<String>, percentage: u8) -> Self {
        Self {
            kind: "overall".to_string(),
            status: status.into(),
            percentage,
        }
    }
}

/// Topic-keyed broadcast hub for progress events.
///
/// Thread-safe, cloneable. Channels are created lazily on first subscribe;
/// publishing to a topic nobody listens to is a no-op.
#[derive(Clone)]
pub struct ProgressHub {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<ProgressUpdate>>>>,
    capacity: usize,
}

impl ProgressHub {
    /// Create a hub with the default capacity (256 buffered updates per topic).
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Publish an update to a topic. No-op if no subscribers.
    pub async fn publish(&self, topic: &str, update: ProgressUpdate) {
        let channels = self.channels.read().await;
        if let Some(tx) = channels.get(topic) {
            // Send errors only mean every receiver is gone.
            let _ = tx.send(update);
        }
    }

    /// Subscribe to a topic, creating its channel if needed.
    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<ProgressUpdate> {
        let mut channels = self.channels.write().await;
        let tx = channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        tx.subscribe()
    }

    /// Drop channels with zero subscribers (housekeeping).
    pub async fn cleanup(&self) {
        let mut channels = self.channels.write().await;
        channels.retain(|_, tx| tx.receiver_count() > 0);
    }
}

impl Default for ProgressHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_subscribe_roundtrip() {
        let hub = ProgressHub::new();
        let mut rx = hub.subscribe(PROGRESS_TOPIC).await;

        let update = ProgressUpdate::overall("Downloading audio", 10);
        hub.publish(PROGRESS_TOPIC, update.clone()).await;

        assert_eq!(rx.recv().await.unwrap(), update);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let hub = ProgressHub::new();
        hub.publish("nobody", ProgressUpdate::overall("dropped", 50))
            .await;
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_update() {
        let hub = ProgressHub::new();
        let mut rx1 = hub.subscribe(PROGRESS_TOPIC).await;
        let mut rx2 = hub.subscribe(PROGRESS_TOPIC).await;

        let update = ProgressUpdate::overall("Transcribing", 42);
        hub.publish(PROGRESS_TOPIC, update.clone()).await;

        assert_eq!(rx1.recv().await.unwrap(), update);
        assert_eq!(rx2.recv().await.unwrap(), update);
    }

    #[tokio::test]
    async fn test_cleanup_removes_idle_channels() {
        let hub = ProgressHub::new();
        let rx = hub.subscribe("ephemeral").await;

        assert_eq!(hub.channels.read().await.len(), 1);
        drop(rx);
        hub.cleanup().await;
        assert_eq!(hub.channels.read().await.len(), 0);
    }

    #[test]
    fn test_update_serializes_with_type_tag() {
        let update = ProgressUpdate::overall("Processing complete!", 100);
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["type"], "overall");
        assert_eq!(value["percentage"], 100);
    }
}
