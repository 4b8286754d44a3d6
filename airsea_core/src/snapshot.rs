//! Read-side views of the engine state.
//!
//! A [`Snapshot`] is a set of `Arc` handles taken after one reconciliation
//! step. Holding it pins that version: later reports build new containers
//! instead of touching the ones referenced here.

use crate::report::{NodeReport, Summary};
use crate::store::NodeMap;
use crate::track::{Track, TrackMap};
use serde::Serialize;
use std::sync::Arc;

/// Immutable, cheaply clonable view of nodes, tracks and the last summary.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Number of reconciliation steps (reports + summaries) applied so far
    pub version: u64,
    
    /// Latest report per node
    pub nodes: Arc<NodeMap>,
    
    /// Track per node (only nodes that ever had a usable fix)
    pub tracks: Arc<TrackMap>,
    
    /// Last summary received, verbatim
    pub summary: Option<Arc<Summary>>,
}

impl Snapshot {
    pub fn node(&self, node_id: &str) -> Option<&NodeReport> {
        self.nodes.get(node_id).map(|report| report.as_ref())
    }
    
    pub fn track(&self, node_id: &str) -> Option<&Track> {
        self.tracks.get(node_id).map(|track| track.as_ref())
    }
    
    /// Nodes whose latest report carries a usable position.
    pub fn gps_nodes(&self) -> impl Iterator<Item = &NodeReport> {
        self.nodes
            .values()
            .map(|report| report.as_ref())
            .filter(|report| report.is_positionally_usable())
    }
    
    /// Counters for a status header.
    pub fn stats(&self) -> FleetStats {
        FleetStats {
            total_nodes: self.nodes.len(),
            gps_nodes: self.gps_nodes().count(),
            tracked_nodes: self.tracks.len(),
            track_points: self.tracks.values().map(|track| track.len()).sum(),
        }
    }
}

/// Fleet-level counts derived from a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FleetStats {
    /// Nodes with any report on file
    pub total_nodes: usize,
    
    /// Nodes whose latest report is positionally usable
    pub gps_nodes: usize,
    
    /// Nodes with a track
    pub tracked_nodes: usize,
    
    /// Points summed over all tracks
    pub track_points: usize,
}
