//! Ingest Runtime - drives the reconcile engine from a pub/sub transport.
//!
//! This module is the message handler between the environment abstraction
//! (`IngestContext` + `MessageTransport`) and the pure [`ReconcileEngine`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      IngestRuntime                          │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │  Transport: MessageTransport                         │   │
//! │  │  • airsea/base/nodes/+  → NodeReport (JSON)          │   │
//! │  │  • airsea/base/summary  → Summary (JSON)             │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                              │                              │
//! │  ┌────────────────────┐   ┌────────────────────────────┐    │
//! │  │  ReconcileEngine   │──►│ watch::Sender<Snapshot>    │    │
//! │  └────────────────────┘   └────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Malformed payloads are logged and counted here; they never reach the engine.
//!
//! # Usage
//!
//! ```ignore
//! use airsea_core::{IngestConfig, IngestRuntime, ReconcileEngine};
//! use airsea_env::{ChannelTransport, TokioContext};
//!
//! let (transport, publisher) = ChannelTransport::pair(1024);
//! let runtime = IngestRuntime::new(
//!     TokioContext::shared(),
//!     Arc::new(transport),
//!     ReconcileEngine::with_defaults(),
//!     IngestConfig::default(),
//! );
//! let mut snapshots = runtime.watch();
//! tokio::spawn(runtime.run());
//! ```

use airsea_env::{IngestContext, InboundMessage, MessageTransport, Topic, NODE_TOPIC_FILTER, SUMMARY_TOPIC};
use crate::error::IngestError;
use crate::reconcile::{ReconcileEngine, TrackAction};
use crate::report::{NodeReport, Summary};
use crate::snapshot::Snapshot;

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Configuration for an ingest runtime.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Runtime's logical name (for logging)
    pub name: String,
    
    /// Filter for per-node report topics (default: `airsea/base/nodes/+`)
    pub node_topic_filter: String,
    
    /// Summary topic (default: `airsea/base/summary`)
    pub summary_topic: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            name: "airsea-ingest".to_string(),
            node_topic_filter: NODE_TOPIC_FILTER.to_string(),
            summary_topic: SUMMARY_TOPIC.to_string(),
        }
    }
}

/// What a single message turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum Handled {
    Report { node_id: String, action: TrackAction },
    Summary { cycle: u64 },
}

/// Message counters for one runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Every message pulled off the transport
    pub messages: u64,
    pub reports: u64,
    pub summaries: u64,
    
    /// Undecodable or unroutable messages
    pub rejected: u64,
    
    /// Context time of the last message, if any
    #[serde(skip)]
    pub last_message_at: Option<Duration>,
}

/// Owns the engine and feeds it from a transport.
///
/// Generic over the context and transport implementations, so the same
/// runtime runs against a broker bridge or the simulation harness.
pub struct IngestRuntime<Ctx, T>
where
    Ctx: IngestContext,
    T: MessageTransport,
{
    /// Environment context
    pub context: Arc<Ctx>,
    
    /// Message source
    pub transport: Arc<T>,
    
    /// Configuration
    pub config: IngestConfig,
    
    engine: ReconcileEngine,
    snapshots: watch::Sender<Snapshot>,
    stats: IngestStats,
}

impl<Ctx, T> IngestRuntime<Ctx, T>
where
    Ctx: IngestContext,
    T: MessageTransport,
{
    /// Creates a runtime around an existing engine.
    pub fn new(
        context: Arc<Ctx>,
        transport: Arc<T>,
        engine: ReconcileEngine,
        config: IngestConfig,
    ) -> Self {
        let (snapshots, _) = watch::channel(engine.snapshot());
        
        Self {
            context,
            transport,
            config,
            engine,
            snapshots,
            stats: IngestStats::default(),
        }
    }
    
    /// A receiver that always holds the latest snapshot.
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }
    
    pub fn engine(&self) -> &ReconcileEngine {
        &self.engine
    }
    
    pub fn stats(&self) -> IngestStats {
        self.stats
    }
    
    /// Subscribes to the node and summary topics.
    pub async fn subscribe(&self) -> Result<(), IngestError> {
        self.transport.subscribe(&self.config.node_topic_filter).await?;
        self.transport.subscribe(&self.config.summary_topic).await?;
        Ok(())
    }
    
    /// Routes, decodes and applies one message.
    ///
    /// The node id inside the payload is authoritative; the topic only picks
    /// the decoder.
    pub fn handle_message(&mut self, msg: &InboundMessage) -> Result<Handled, IngestError> {
        self.stats.messages += 1;
        self.stats.last_message_at = Some(self.context.now());
        
        let result = self.route(msg);
        match &result {
            Ok(Handled::Report { .. }) => self.stats.reports += 1,
            Ok(Handled::Summary { .. }) => self.stats.summaries += 1,
            Err(_) => self.stats.rejected += 1,
        }
        result
    }
    
    fn route(&mut self, msg: &InboundMessage) -> Result<Handled, IngestError> {
        match Topic::classify(&msg.topic) {
            Some(Topic::Node(topic_id)) => {
                let report: NodeReport = decode(msg)?;
                if report.node_id != topic_id {
                    debug!(topic_id = %topic_id, node_id = %report.node_id, "topic and payload node ids differ");
                }
                
                let node_id = report.node_id.clone();
                let outcome = self.engine.apply_report(report);
                self.snapshots.send_replace(outcome.snapshot);
                
                Ok(Handled::Report { node_id, action: outcome.action })
            }
            Some(Topic::Summary) => {
                let summary: Summary = decode(msg)?;
                let cycle = summary.cycle;
                let snapshot = self.engine.apply_summary(summary);
                self.snapshots.send_replace(snapshot);
                
                Ok(Handled::Summary { cycle })
            }
            None => Err(IngestError::UnroutableTopic(msg.topic.clone())),
        }
    }
    
    /// Subscribes, then applies messages until the transport closes.
    ///
    /// Per-message failures are logged and counted; only a failed
    /// subscription ends the run early. Returns the runtime for inspection.
    pub async fn run(mut self) -> Result<Self, IngestError> {
        self.subscribe().await?;
        info!(name = %self.config.name, seed = self.context.seed(), "ingest started");
        
        while let Some(msg) = self.transport.recv().await {
            if let Err(e) = self.handle_message(&msg) {
                warn!(topic = %msg.topic, payload = %msg.payload_str(), error = %e, "discarding message");
            }
        }
        
        let stats = self.engine.snapshot().stats();
        info!(
            name = %self.config.name,
            status = %self.transport.status(),
            messages = self.stats.messages,
            rejected = self.stats.rejected,
            nodes = stats.total_nodes,
            tracks = stats.tracked_nodes,
            "ingest stopped"
        );
        
        Ok(self)
    }
}

fn decode<D: serde::de::DeserializeOwned>(msg: &InboundMessage) -> Result<D, IngestError> {
    serde_json::from_slice(&msg.payload).map_err(|source| IngestError::Decode {
        topic: msg.topic.clone(),
        source,
    })
}
