//! Scenario runner - drives the ingest runtime with a synthetic fleet.
//!
//! Each run publishes oracle reports over a [`ChannelTransport`] exactly as a
//! broker bridge would, lets a spawned [`IngestRuntime`] reconcile them, and
//! then audits the final snapshot against everything that was sent.

use crate::context::SimContext;
use crate::error::SimError;
use crate::oracle::{FleetOracle, DEFAULT_CENTER};
use crate::scenarios::ScenarioId;

use airsea_core::{
    IngestConfig, IngestRuntime, IngestStats, NodeReport, ReconcileEngine, ReconcileStats, Snapshot,
    TrackPoint, TrackingConfig,
};
use airsea_env::{ChannelPublisher, ChannelTransport, IngestContext, Topic, SUMMARY_TOPIC};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Buffer between the publishing harness and the ingest task.
const CHANNEL_CAPACITY: usize = 256;

/// Published every cycle but outside every subscription.
const UNSUBSCRIBED_TOPIC: &str = "airsea/base/weather";

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,
    
    /// Seed used
    pub seed: u64,
    
    /// Whether scenario passed all assertions
    pub passed: bool,
    
    /// Poll cycles executed
    pub cycles: u64,
    
    /// Nodes in the store at end
    pub final_node_count: usize,
    
    /// Tracks at end
    pub final_track_count: usize,
    
    /// Failure message if any
    pub failure_reason: Option<String>,
    
    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
    
    /// Ingest counters
    pub ingest: IngestStats,
    
    /// Engine counters
    pub reconcile: ReconcileStats,
    
    /// Final engine state
    pub snapshot: Snapshot,
}

impl ScenarioResult {
    fn aborted(scenario: ScenarioId, seed: u64, reason: String) -> Self {
        Self {
            scenario,
            seed,
            passed: false,
            cycles: 0,
            final_node_count: 0,
            final_track_count: 0,
            failure_reason: Some(reason),
            metrics: ScenarioMetrics::default(),
            ingest: IngestStats::default(),
            reconcile: ReconcileStats::default(),
            snapshot: Snapshot::default(),
        }
    }
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioMetrics {
    /// Node reports published
    pub reports_sent: u64,
    
    /// Published reports that carried a usable fix
    pub usable_reports: u64,
    
    /// Summaries published
    pub summaries_sent: u64,
    
    /// Malformed payloads published
    pub garbage_sent: u64,
    
    /// Messages published on topics nobody subscribed to
    pub unsubscribed_sent: u64,
    
    /// Longest track at end
    pub max_track_len: usize,
    
    /// Points across all tracks at end
    pub track_points: usize,
}

/// What the harness put on the wire, as the receiver decodes it.
#[derive(Debug, Default)]
struct Ledger {
    last_sent: HashMap<String, NodeReport>,
    fixes: HashMap<String, Vec<TrackPoint>>,
    metrics: ScenarioMetrics,
}

impl Ledger {
    fn record(&mut self, payload: &[u8]) -> Result<(), SimError> {
        let wire: NodeReport = serde_json::from_slice(payload)?;
        
        self.metrics.reports_sent += 1;
        if let Some(point) = wire.position() {
            self.metrics.usable_reports += 1;
            self.fixes.entry(wire.node_id.clone()).or_default().push(point);
        }
        self.last_sent.insert(wire.node_id.clone(), wire);
        Ok(())
    }
}

/// Runs fleet scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,
    
    /// Number of simulated nodes
    num_nodes: usize,
    
    /// Cycle override (scenario default if unset)
    cycles: Option<u64>,
    
    /// Engine configuration under test
    config: TrackingConfig,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64, num_nodes: usize) -> Self {
        Self {
            seed,
            num_nodes: num_nodes.max(1),
            cycles: None,
            config: TrackingConfig::default(),
        }
    }
    
    /// Overrides the number of poll cycles.
    pub fn with_cycles(mut self, cycles: u64) -> Self {
        self.cycles = Some(cycles);
        self
    }
    
    /// Sets the tracking configuration handed to the engine.
    pub fn with_config(mut self, config: TrackingConfig) -> Self {
        self.config = config;
        self
    }
    
    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        debug!("  {}", scenario.description());
        
        match self.execute(scenario) {
            Ok(result) => result,
            Err(e) => {
                warn!(scenario = %scenario, error = %e, "scenario aborted");
                ScenarioResult::aborted(scenario, self.seed, e.to_string())
            }
        }
    }
    
    fn execute(&self, scenario: ScenarioId) -> Result<ScenarioResult, SimError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        runtime.block_on(self.drive(scenario))
    }
    
    async fn drive(&self, scenario: ScenarioId) -> Result<ScenarioResult, SimError> {
        let physics_seed = self.seed.wrapping_mul(0x9e3779b97f4a7c15);
        let context = SimContext::shared(self.seed);
        let mut oracle = FleetOracle::new(physics_seed);
        self.populate(scenario, &mut oracle);
        
        let (transport, publisher) = ChannelTransport::pair(CHANNEL_CAPACITY);
        let ingest = IngestRuntime::new(
            context.clone(),
            Arc::new(transport),
            ReconcileEngine::new(self.config)?,
            IngestConfig {
                name: format!("sim-{}", scenario.name()),
                ..IngestConfig::default()
            },
        );
        let handle = tokio::spawn(ingest.run());
        
        let cycles = self.cycles.unwrap_or_else(|| scenario.default_cycles());
        let dt = scenario.cycle_secs();
        let mut ledger = Ledger::default();
        
        for cycle in 0..cycles {
            if cycle > 0 {
                // Virtual sleep: moves the clock and lets the ingest task drain
                context.sleep(Duration::from_secs_f64(dt)).await;
                oracle.step(dt);
            }
            
            let timestamp = context.unix_secs() as f64;
            let reports = oracle.reports(timestamp);
            for report in &reports {
                let payload = serde_json::to_vec(report)?;
                ledger.record(&payload)?;
                publisher.publish(Topic::node(&report.node_id), payload).await?;
            }
            
            if scenario == ScenarioId::Garbage {
                ledger.metrics.garbage_sent += publish_garbage(&publisher, &reports).await?;
            }
            publisher.publish(UNSUBSCRIBED_TOPIC, b"{\"temp_c\":31}".to_vec()).await?;
            ledger.metrics.unsubscribed_sent += 1;
            
            let summary = oracle.summary(cycle + 1, timestamp, &reports);
            publisher.publish(SUMMARY_TOPIC, serde_json::to_vec(&summary)?).await?;
            ledger.metrics.summaries_sent += 1;
            
            if cycle % 50 == 0 {
                debug!("  cycle={} | t={:.0}s | reports={}", cycle, oracle.time(), ledger.metrics.reports_sent);
            }
        }
        
        // Closing the only publisher ends the ingest loop
        drop(publisher);
        let ingest = handle.await.map_err(|e| SimError::Join(e.to_string()))??;
        
        let snapshot = ingest.engine().snapshot();
        let ingest_stats = ingest.stats();
        let reconcile = ingest.engine().stats();
        
        ledger.metrics.track_points = snapshot.stats().track_points;
        ledger.metrics.max_track_len = snapshot.tracks.values().map(|t| t.len()).max().unwrap_or(0);
        
        let verdict = check_invariants(&snapshot, &self.config)
            .and_then(|_| check_delivery(&ledger, &ingest_stats, &snapshot, cycles))
            .and_then(|_| check_provenance(&ledger, &snapshot))
            .and_then(|_| check_scenario(scenario, &ledger, &snapshot, &reconcile, &self.config));
        
        Ok(ScenarioResult {
            scenario,
            seed: self.seed,
            passed: verdict.is_ok(),
            cycles,
            final_node_count: snapshot.nodes.len(),
            final_track_count: snapshot.tracks.len(),
            failure_reason: verdict.err(),
            metrics: ledger.metrics,
            ingest: ingest_stats,
            reconcile,
            snapshot,
        })
    }
    
    fn populate(&self, scenario: ScenarioId, oracle: &mut FleetOracle) {
        for i in 0..self.num_nodes {
            let commute_speed = 2.0 + (i % 14) as f64;
            match scenario {
                ScenarioId::StationaryJitter => {
                    oracle.spawn_random(DEFAULT_CENTER, 0.0, 1.0, 0.0);
                }
                ScenarioId::Commute | ScenarioId::Garbage => {
                    oracle.spawn_random(DEFAULT_CENTER, commute_speed, 3.0, 0.0);
                }
                ScenarioId::GpsDropout => {
                    // Node 0 never gets a fix
                    let dropout = if i == 0 { 1.0 } else { 0.3 };
                    oracle.spawn_random(DEFAULT_CENTER, 8.0, 2.0, dropout);
                }
                ScenarioId::LongHaul => {
                    oracle.spawn_random(DEFAULT_CENTER, 50.0, 0.0, 0.0);
                }
            }
        }
    }
}

/// Publishes one batch of malformed payloads; returns how many were sent.
async fn publish_garbage(publisher: &ChannelPublisher, reports: &[NodeReport]) -> Result<u64, SimError> {
    let victim = reports.first().map(|r| r.node_id.as_str()).unwrap_or("!00000000");
    
    publisher.publish(Topic::node("!garbage"), b"{not json".to_vec()).await?;
    publisher.publish(Topic::node(victim), format!("{{\"node_id\":\"{}\"}}", victim).into_bytes()).await?;
    publisher.publish(SUMMARY_TOPIC, b"[1,2,3]".to_vec()).await?;
    
    Ok(3)
}

// ============================================================================
// CHECKS
// ============================================================================

/// Structural invariants any snapshot must satisfy.
///
/// Every track has between 1 and `max_track_points` points, consecutive
/// points are strictly farther apart than the movement threshold, and every
/// tracked node has a report on file.
pub fn check_invariants(snapshot: &Snapshot, config: &TrackingConfig) -> Result<(), String> {
    for (node_id, track) in snapshot.tracks.iter() {
        if track.is_empty() || track.len() > config.max_track_points {
            return Err(format!("{}: track length {} out of bounds", node_id, track.len()));
        }
        
        if !snapshot.nodes.contains_key(node_id) {
            return Err(format!("{}: tracked but not in store", node_id));
        }
        
        for pair in track.to_vec().windows(2) {
            let distance = pair[0].distance_to(&pair[1], config.earth_radius_m);
            if distance <= config.movement_threshold_m {
                return Err(format!(
                    "{}: consecutive points only {:.2}m apart (threshold {}m)",
                    node_id, distance, config.movement_threshold_m
                ));
            }
        }
    }
    
    Ok(())
}

/// Every message was counted once and the store holds the last report sent.
fn check_delivery(ledger: &Ledger, ingest: &IngestStats, snapshot: &Snapshot, cycles: u64) -> Result<(), String> {
    let m = &ledger.metrics;
    
    if ingest.reports != m.reports_sent || ingest.summaries != m.summaries_sent {
        return Err(format!(
            "delivered {} reports / {} summaries, sent {} / {}",
            ingest.reports, ingest.summaries, m.reports_sent, m.summaries_sent
        ));
    }
    
    if ingest.rejected != m.garbage_sent {
        return Err(format!("rejected {} messages, {} were malformed", ingest.rejected, m.garbage_sent));
    }
    
    let expected_messages = m.reports_sent + m.summaries_sent + m.garbage_sent;
    if ingest.messages != expected_messages {
        return Err(format!(
            "handled {} messages, expected {} (unsubscribed traffic leaked?)",
            ingest.messages, expected_messages
        ));
    }
    
    if snapshot.nodes.len() != ledger.last_sent.len() {
        return Err(format!("store has {} nodes, {} were reported", snapshot.nodes.len(), ledger.last_sent.len()));
    }
    
    for (node_id, sent) in &ledger.last_sent {
        if snapshot.node(node_id) != Some(sent) {
            return Err(format!("{}: stored report is not the last one sent", node_id));
        }
    }
    
    let last_cycle = snapshot.summary.as_ref().map(|s| s.cycle);
    if cycles > 0 && last_cycle != Some(cycles) {
        return Err(format!("last summary cycle {:?}, expected {}", last_cycle, cycles));
    }
    
    Ok(())
}

/// Tracks exist exactly for nodes that sent a usable fix, and only hold such fixes.
fn check_provenance(ledger: &Ledger, snapshot: &Snapshot) -> Result<(), String> {
    for node_id in ledger.last_sent.keys() {
        let has_fix = ledger.fixes.contains_key(node_id);
        if has_fix != snapshot.tracks.contains_key(node_id) {
            return Err(format!("{}: usable fix sent = {}, tracked = {}", node_id, has_fix, !has_fix));
        }
    }
    
    for (node_id, track) in snapshot.tracks.iter() {
        let fixes = ledger.fixes.get(node_id).map(|f| f.as_slice()).unwrap_or(&[]);
        if let Some(point) = track.iter().find(|p| !fixes.contains(*p)) {
            return Err(format!("{}: track point ({}, {}) was never reported", node_id, point.lat, point.lng));
        }
    }
    
    Ok(())
}

fn check_scenario(
    scenario: ScenarioId,
    ledger: &Ledger,
    snapshot: &Snapshot,
    reconcile: &ReconcileStats,
    config: &TrackingConfig,
) -> Result<(), String> {
    match scenario {
        ScenarioId::StationaryJitter => {
            if let Some((node_id, track)) = snapshot.tracks.iter().find(|(_, t)| t.len() != 1) {
                return Err(format!("{}: parked node grew a {}-point track", node_id, track.len()));
            }
        }
        ScenarioId::Commute | ScenarioId::Garbage => {
            if reconcile.points_appended == 0 {
                return Err("no track grew while nodes were moving".to_string());
            }
        }
        ScenarioId::GpsDropout => {
            if reconcile.unusable == 0 {
                return Err("no dropout was observed".to_string());
            }
            if let Some(blind) = snapshot.nodes.keys().find(|id| !ledger.fixes.contains_key(*id)) {
                if snapshot.track(blind).is_some() {
                    return Err(format!("{}: never had a fix but is tracked", blind));
                }
            }
        }
        ScenarioId::LongHaul => {
            for (node_id, fixes) in &ledger.fixes {
                let track = snapshot
                    .track(node_id)
                    .ok_or_else(|| format!("{}: missing track", node_id))?;
                
                let expected_len = fixes.len().min(config.max_track_points);
                if track.len() != expected_len {
                    return Err(format!("{}: track length {}, expected {}", node_id, track.len(), expected_len));
                }
                
                // Oldest points were evicted first
                if track.to_vec().as_slice() != &fixes[fixes.len() - expected_len..] {
                    return Err(format!("{}: track is not the newest {} fixes in order", node_id, expected_len));
                }
            }
        }
    }
    
    Ok(())
}
