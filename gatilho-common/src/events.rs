//! Event types for the analysis notification channels
//!
//! Server→client events are shared by the WebSocket and SSE transports and
//! serialize to `{"type": "PROGRESS_UPDATE", ...}` style JSON objects.
//! Every event names the analysis it belongs to, so one connection can
//! follow several analyses.
//!
//! [`ProgressRegistry`] keeps one broadcast channel per analysis. A
//! sequencer publishes into its own analysis channel only; transports
//! subscribe to the analyses they care about.

use crate::db::{AnalysisType, Priority};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// Server→client event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisEvent {
    /// Sequencer entered a phase
    ProgressUpdate {
        #[serde(rename = "analysisId")]
        analysis_id: Uuid,
        /// Phase label (e.g. "DATA_COLLECTION")
        phase: String,
        /// Literal phase percentage
        progress: u8,
        /// Human-readable phase message
        message: String,
    },

    /// Sequencer finished with a report attached
    AnalysisComplete {
        #[serde(rename = "analysisId")]
        analysis_id: Uuid,
        progress: u8,
        report: serde_json::Value,
    },

    /// Sequencer failed, or a client message could not be handled
    Error {
        #[serde(rename = "analysisId", default, skip_serializing_if = "Option::is_none")]
        analysis_id: Option<Uuid>,
        message: String,
    },
}

impl AnalysisEvent {
    /// Event type string, used as the SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            AnalysisEvent::ProgressUpdate { .. } => "PROGRESS_UPDATE",
            AnalysisEvent::AnalysisComplete { .. } => "ANALYSIS_COMPLETE",
            AnalysisEvent::Error { .. } => "ERROR",
        }
    }

    /// Analysis this event belongs to, if any
    pub fn analysis_id(&self) -> Option<Uuid> {
        match self {
            AnalysisEvent::ProgressUpdate { analysis_id, .. }
            | AnalysisEvent::AnalysisComplete { analysis_id, .. } => Some(*analysis_id),
            AnalysisEvent::Error { analysis_id, .. } => *analysis_id,
        }
    }

    /// Completion and error end an analysis stream
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AnalysisEvent::AnalysisComplete { .. } | AnalysisEvent::Error { .. }
        )
    }
}

/// Client→server message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Run the stage sequencer for one analysis
    StartAnalysis { payload: StartAnalysisPayload },
}

/// Intake fields carried by `START_ANALYSIS`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAnalysisPayload {
    pub product: String,
    pub target: String,
    #[serde(default)]
    pub competitors: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    /// Identifier of a record created through `POST /api/analysis`
    #[serde(default)]
    pub analysis_id: Option<Uuid>,
    #[serde(default)]
    pub analysis_type: AnalysisType,
    #[serde(default, alias = "urgency")]
    pub priority: Priority,
}

/// Session-keyed registry of per-analysis event channels
#[derive(Clone)]
pub struct ProgressRegistry {
    channels: Arc<RwLock<HashMap<Uuid, Channel>>>,
    capacity: usize,
}

struct Channel {
    tx: broadcast::Sender<AnalysisEvent>,
    /// A sequencer holds a publisher for this channel
    running: bool,
}

impl ProgressRegistry {
    /// Creates a registry whose channels buffer `capacity` events each
    ///
    /// A subscriber lagging by more than `capacity` events loses the oldest.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    async fn sender(&self, analysis_id: Uuid, running: bool) -> broadcast::Sender<AnalysisEvent> {
        if !running {
            if let Some(channel) = self.channels.read().await.get(&analysis_id) {
                return channel.tx.clone();
            }
        }

        let mut channels = self.channels.write().await;
        let channel = channels.entry(analysis_id).or_insert_with(|| Channel {
            tx: broadcast::channel(self.capacity).0,
            running: false,
        });
        channel.running |= running;
        channel.tx.clone()
    }

    /// Subscribe to future events of one analysis
    ///
    /// Events published before subscription are not received. A subscriber
    /// that gives up before any run starts should call [`Self::release_if_idle`].
    pub async fn subscribe(&self, analysis_id: Uuid) -> broadcast::Receiver<AnalysisEvent> {
        self.sender(analysis_id, false).await.subscribe()
    }

    /// Publisher bound to one analysis channel; marks the analysis running
    pub async fn publisher(&self, analysis_id: Uuid) -> AnalysisPublisher {
        AnalysisPublisher {
            analysis_id,
            tx: self.sender(analysis_id, true).await,
        }
    }

    /// Drop the registry's handle on an analysis channel
    ///
    /// Subscribers see the channel close once every publisher is dropped.
    pub async fn close(&self, analysis_id: Uuid) {
        self.channels.write().await.remove(&analysis_id);
    }

    /// Drop a channel nobody publishes to and nobody listens on
    ///
    /// Returns whether the channel was removed.
    pub async fn release_if_idle(&self, analysis_id: Uuid) -> bool {
        let mut channels = self.channels.write().await;
        let idle = channels
            .get(&analysis_id)
            .map(|channel| !channel.running && channel.tx.receiver_count() == 0)
            .unwrap_or(false);
        if idle {
            channels.remove(&analysis_id);
        }
        idle
    }

    /// Number of analyses with a running sequencer
    pub async fn active_count(&self) -> usize {
        self.channels
            .read()
            .await
            .values()
            .filter(|channel| channel.running)
            .count()
    }

    /// Number of open channels, running or only subscribed
    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Configured per-channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Sending half of one analysis channel
#[derive(Clone)]
pub struct AnalysisPublisher {
    analysis_id: Uuid,
    tx: broadcast::Sender<AnalysisEvent>,
}

impl AnalysisPublisher {
    pub fn analysis_id(&self) -> Uuid {
        self.analysis_id
    }

    /// Emit an event, ignoring the case where nobody is listening
    ///
    /// The persisted record stays authoritative, so a missing listener is
    /// not an error.
    pub fn emit_lossy(&self, event: AnalysisEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!(analysis_id = %self.analysis_id, "No subscribers for analysis event");
        }
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
