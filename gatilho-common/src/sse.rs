//! Server-Sent Events (SSE) utilities
//!
//! Streams one analysis channel to an HTTP client. The stream starts with
//! caller-supplied snapshot events (the persisted state), then forwards live
//! events until a terminal event arrives or the channel closes.

use crate::events::{AnalysisEvent, ProgressRegistry};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Convert an analysis event into an SSE frame named after its type
pub fn to_sse_event(event: &AnalysisEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().event(event.event_type()).data(json)),
        Err(e) => {
            warn!("SSE: Failed to serialize event {}: {}", event.event_type(), e);
            None
        }
    }
}

/// Releases the registry entry of a stream whose analysis never ran
///
/// Runs when the stream is dropped, whether it finished or the client left.
struct SubscriptionGuard {
    registry: ProgressRegistry,
    analysis_id: Uuid,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let registry = self.registry.clone();
        let analysis_id = self.analysis_id;
        handle.spawn(async move {
            if registry.release_if_idle(analysis_id).await {
                debug!(analysis_id = %analysis_id, "SSE: Released idle analysis channel");
            }
        });
    }
}

/// SSE stream for one analysis: snapshot first, then live events
///
/// `rx` must be subscribed before the snapshot is read so no event falls
/// between the two. The channel is released when the stream is dropped
/// and no sequencer has claimed it.
pub fn analysis_event_stream(
    registry: ProgressRegistry,
    analysis_id: Uuid,
    snapshot: Vec<AnalysisEvent>,
    mut rx: broadcast::Receiver<AnalysisEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(analysis_id = %analysis_id, "New SSE client connected to analysis events");
    let guard = SubscriptionGuard {
        registry,
        analysis_id,
    };

    let stream = async_stream::stream! {
        let _guard = guard;
        let mut finished = false;

        for event in snapshot {
            finished |= event.is_terminal();
            if let Some(frame) = to_sse_event(&event) {
                yield Ok(frame);
            }
        }

        while !finished {
            tokio::select! {
                _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }

                received = rx.recv() => {
                    match received {
                        Ok(event) => {
                            finished = event.is_terminal();
                            if let Some(frame) = to_sse_event(&event) {
                                debug!(analysis_id = %analysis_id, "SSE: Forwarding {}", event.event_type());
                                yield Ok(frame);
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(analysis_id = %analysis_id, skipped, "SSE: Client lagged, events dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            finished = true;
                        }
                    }
                }
            }
        }

        info!(analysis_id = %analysis_id, "SSE: Analysis event stream finished");
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_sse_event_serializes() {
        let event = AnalysisEvent::Error {
            analysis_id: None,
            message: "x".to_string(),
        };
        assert!(to_sse_event(&event).is_some());
    }

    #[tokio::test]
    async fn test_dropped_stream_releases_idle_channel() {
        let registry = ProgressRegistry::new(4);
        let id = Uuid::new_v4();
        let rx = registry.subscribe(id).await;

        let sse = analysis_event_stream(registry.clone(), id, Vec::new(), rx);
        assert_eq!(registry.channel_count().await, 1);
        drop(sse);

        for _ in 0..100 {
            if registry.channel_count().await == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(registry.channel_count().await, 0);
    }

    #[tokio::test]
    async fn test_dropped_stream_keeps_running_channel() {
        let registry = ProgressRegistry::new(4);
        let id = Uuid::new_v4();
        let rx = registry.subscribe(id).await;
        let _publisher = registry.publisher(id).await;

        drop(analysis_event_stream(registry.clone(), id, Vec::new(), rx));
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(registry.active_count().await, 1);
    }
}
