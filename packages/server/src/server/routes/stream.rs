//! SSE streaming endpoint.
//!
//! GET /api/streams/:topic
//!
//! Subscribes to the progress hub by topic string and forwards updates as
//! SSE events. Pipelines publish to the `progress` topic; clients that fall
//! behind the broadcast buffer receive a `lagged` event with the number of
//! missed updates.

use std::convert::Infallible;

use axum::{
    extract::{Extension, Path},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, StreamExt};
use tokio_stream::wrappers::BroadcastStream;

use crate::server::app::AxumAppState;

/// SSE stream handler.
pub async fn stream_handler(
    Extension(state): Extension<AxumAppState>,
    Path(topic): Path<String>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.deps.progress_hub.subscribe(&topic).await;

    let connected =
        stream::once(async { Ok::<_, Infallible>(Event::default().event("connected").data("ok")) });

    let events = BroadcastStream::new(rx).filter_map(|result| async {
        match result {
            Ok(update) => Event::default()
                .event("progress_update")
                .json_data(&update)
                .ok()
                .map(Ok),
            Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(n)) => {
                Event::default()
                    .event("lagged")
                    .json_data(&serde_json::json!({"missed": n}))
                    .ok()
                    .map(Ok)
            }
        }
    });

    Sse::new(connected.chain(events)).keep_alive(KeepAlive::default())
}
