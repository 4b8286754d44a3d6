//! JSON exporter for finished scenario runs.
//!
//! Dumps the final fleet state (latest reports, tracks, counters) so a run
//! can be inspected or plotted offline.

use crate::runner::{ScenarioMetrics, ScenarioResult};
use airsea_core::{FleetStats, IngestStats, NodeReport, ReconcileStats, Summary, TrackPoint};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;

/// Complete simulation export.
#[derive(Debug, Clone, Serialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,
    
    /// Seed used
    pub seed: u64,
    
    /// Poll cycles executed
    pub cycles: u64,
    
    /// Final results
    pub passed: bool,
    
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    
    pub fleet: FleetStats,
    pub ingest: IngestStats,
    pub reconcile: ReconcileStats,
    pub metrics: ScenarioMetrics,
    
    /// Last summary received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    
    /// Latest report per node, sorted by node id
    pub nodes: Vec<NodeReport>,
    
    /// Track per node as `[lat, lng]` pairs, oldest first
    pub tracks: BTreeMap<String, Vec<TrackPoint>>,
}

impl SimExport {
    /// Builds an export from a finished run.
    pub fn from_result(result: &ScenarioResult) -> Self {
        let snapshot = &result.snapshot;
        
        let mut nodes: Vec<NodeReport> = snapshot.nodes.values().map(|r| r.as_ref().clone()).collect();
        nodes.sort_by(|a, b| a.node_id.cmp(&b.node_id));
        
        let tracks = snapshot
            .tracks
            .iter()
            .map(|(id, track)| (id.clone(), track.to_vec()))
            .collect();
        
        Self {
            scenario: result.scenario.name().to_string(),
            seed: result.seed,
            cycles: result.cycles,
            passed: result.passed,
            failure_reason: result.failure_reason.clone(),
            fleet: snapshot.stats(),
            ingest: result.ingest,
            reconcile: result.reconcile,
            metrics: result.metrics.clone(),
            summary: snapshot.summary.as_deref().cloned(),
            nodes,
            tracks,
        }
    }
    
    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> Result<(), crate::SimError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
