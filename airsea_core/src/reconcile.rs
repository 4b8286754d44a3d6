//! The RECONCILE Engine - one step per incoming report.
//!
//! Solves the "who owns the state" problem of a callback-driven client by
//! keeping the node store and the track book together in one owner:
//! 1. Usability check (GPS flag + non-zero coordinates)
//! 2. Track decision (initialize for new nodes, update on coordinate change)
//! 3. Store overwrite (last write wins)
//! 4. Snapshot publication (copy-on-write)
//!
//! Each step is total: no input makes it fail.

use crate::config::TrackingConfig;
use crate::error::ConfigError;
use crate::report::{NodeReport, Summary};
use crate::snapshot::Snapshot;
use crate::store::NodeStore;
use crate::track::{TrackBook, TrackUpdate};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

// ============================================================================
// TRACK ACTION (Output)
// ============================================================================

/// What reconciliation did to the track collection for one report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackAction {
    /// GPS flag off or a zero coordinate; tracks untouched
    Unusable,
    
    /// Usable, but same coordinates as the stored report; tracks untouched
    SamePosition,
    
    /// First report for a new node
    Initialized(TrackUpdate),
    
    /// Known node with changed coordinates
    Updated(TrackUpdate),
}

impl TrackAction {
    /// The builder's verdict, if the builder ran.
    pub fn update(&self) -> Option<TrackUpdate> {
        match self {
            TrackAction::Initialized(update) | TrackAction::Updated(update) => Some(*update),
            TrackAction::Unusable | TrackAction::SamePosition => None,
        }
    }
    
    /// True if the track collection changed.
    pub fn is_mutation(&self) -> bool {
        self.update().map(|u| u.is_mutation()).unwrap_or(false)
    }
}

/// Result of applying one report.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub action: TrackAction,
    pub snapshot: Snapshot,
}

// ============================================================================
// STATISTICS
// ============================================================================

/// Running counters kept by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub reports: u64,
    pub summaries: u64,
    pub unusable: u64,
    pub unchanged_position: u64,
    pub tracks_created: u64,
    pub points_appended: u64,
    pub jitter_suppressed: u64,
    pub points_evicted: u64,
}

impl ReconcileStats {
    fn record(&mut self, action: &TrackAction) {
        self.reports += 1;
        match action {
            TrackAction::Unusable => self.unusable += 1,
            TrackAction::SamePosition => self.unchanged_position += 1,
            TrackAction::Initialized(update) | TrackAction::Updated(update) => match update {
                TrackUpdate::Created => self.tracks_created += 1,
                TrackUpdate::AlreadyTracked => {}
                TrackUpdate::Appended { evicted, .. } => {
                    self.points_appended += 1;
                    if evicted.is_some() {
                        self.points_evicted += 1;
                    }
                }
                TrackUpdate::Suppressed { .. } => self.jitter_suppressed += 1,
            },
        }
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Owns the node store, the track book and the last summary.
///
/// Callers hold the engine and feed it one report at a time, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct ReconcileEngine {
    store: NodeStore,
    tracks: TrackBook,
    summary: Option<Arc<Summary>>,
    version: u64,
    stats: ReconcileStats,
}

impl ReconcileEngine {
    /// Create an engine with the given tracking configuration.
    ///
    /// The configuration is validated here; a running engine never sees one
    /// that would break the spacing or length bounds.
    pub fn new(config: TrackingConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_book(TrackBook::new(config)?))
    }
    
    /// Create an engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::with_book(TrackBook::with_defaults())
    }
    
    fn with_book(tracks: TrackBook) -> Self {
        Self {
            store: NodeStore::new(),
            tracks,
            summary: None,
            version: 0,
            stats: ReconcileStats::default(),
        }
    }
    
    /// Apply one report and return the resulting snapshot.
    pub fn apply_report(&mut self, report: NodeReport) -> ReconcileOutcome {
        let action = match report.position() {
            None => TrackAction::Unusable,
            Some(point) => match self.store.get(&report.node_id) {
                None => TrackAction::Initialized(self.tracks.initialize_track(&report.node_id, point)),
                Some(previous) if !previous.same_coordinates(&report) => {
                    TrackAction::Updated(self.tracks.update_track(&report.node_id, point))
                }
                Some(_) => TrackAction::SamePosition,
            },
        };
        
        if action.update() == Some(TrackUpdate::Created) {
            info!(node_id = %report.node_id, lat = report.latitude, lng = report.longitude, "track started");
        }
        debug!(node_id = %report.node_id, ?action, "report applied");
        
        self.stats.record(&action);
        self.store.upsert(report);
        self.version += 1;
        
        ReconcileOutcome {
            action,
            snapshot: self.snapshot(),
        }
    }
    
    /// Store the fleet summary verbatim.
    pub fn apply_summary(&mut self, summary: Summary) -> Snapshot {
        debug!(cycle = summary.cycle, total_nodes = summary.total_nodes, "summary applied");
        
        self.summary = Some(Arc::new(summary));
        self.stats.summaries += 1;
        self.version += 1;
        self.snapshot()
    }
    
    /// Current state as an immutable snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: self.version,
            nodes: self.store.snapshot(),
            tracks: self.tracks.snapshot(),
            summary: self.summary.clone(),
        }
    }
    
    pub fn config(&self) -> &TrackingConfig {
        self.tracks.config()
    }
    
    pub fn store(&self) -> &NodeStore {
        &self.store
    }
    
    pub fn tracks(&self) -> &TrackBook {
        &self.tracks
    }
    
    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_deref()
    }
    
    pub fn stats(&self) -> ReconcileStats {
        self.stats
    }
    
    pub fn version(&self) -> u64 {
        self.version
    }
}

// ============================================================================
// TESTS
// ============================================================================
