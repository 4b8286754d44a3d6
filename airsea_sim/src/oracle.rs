//! Ground truth oracle for simulation.
//!
//! The Oracle maintains the "God's eye view" of the simulated fleet:
//! - True positions of all nodes
//! - Kinematics (constant velocity on a local tangent plane)
//! - Report generation (GPS jitter, fix dropouts, telemetry noise)

use airsea_core::{NodeReport, Summary, TrackPoint, EARTH_RADIUS_M};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde_json::Map;
use std::collections::HashMap;

/// Default spawn center (central Jakarta).
pub const DEFAULT_CENTER: TrackPoint = TrackPoint { lat: -6.2088, lng: 106.8456 };

/// A ground truth node in the simulation.
#[derive(Debug, Clone)]
pub struct SimNode {
    /// Broker-style node id, e.g. `!0000002a`
    pub node_id: String,
    
    /// True position
    pub position: TrackPoint,
    
    /// Velocity as (north, east) in m/s
    pub velocity_mps: (f64, f64),
    
    /// Per-axis GPS noise standard deviation (meters)
    pub jitter_std_m: f64,
    
    /// Probability that a report carries no fix
    pub dropout_rate: f64,
    
    /// Battery percentage, drains slowly
    pub battery: f64,
    
    jitter: Option<Normal<f64>>,
}

/// Offsets `point` by the given north/east meters on a local tangent plane.
pub fn offset_meters(point: TrackPoint, north_m: f64, east_m: f64) -> TrackPoint {
    let dlat = (north_m / EARTH_RADIUS_M).to_degrees();
    let dlng = (east_m / (EARTH_RADIUS_M * point.lat.to_radians().cos())).to_degrees();
    TrackPoint::new(point.lat + dlat, point.lng + dlng)
}

/// The Oracle - maintains ground truth and generates node reports.
pub struct FleetOracle {
    /// RNG for noise and dropouts
    rng: ChaCha8Rng,
    
    /// All ground truth nodes, in spawn order
    nodes: Vec<SimNode>,
    
    /// Coordinates last reported per node (for the summary's `changed`)
    last_reported: HashMap<String, (f64, f64)>,
    
    /// Current simulation time (seconds)
    current_time: f64,
}

impl FleetOracle {
    /// Creates a new Oracle with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            nodes: Vec::new(),
            last_reported: HashMap::new(),
            current_time: 0.0,
        }
    }
    
    /// Spawns a node and returns its id.
    pub fn spawn_node(
        &mut self,
        position: TrackPoint,
        velocity_mps: (f64, f64),
        jitter_std_m: f64,
        dropout_rate: f64,
    ) -> String {
        let node_id = format!("!{:08x}", self.nodes.len() as u32 + 0x1000);
        let jitter = if jitter_std_m > 0.0 {
            Normal::new(0.0, jitter_std_m).ok()
        } else {
            None
        };
        
        self.nodes.push(SimNode {
            node_id: node_id.clone(),
            position,
            velocity_mps,
            jitter_std_m,
            dropout_rate: dropout_rate.clamp(0.0, 1.0),
            battery: 100.0,
            jitter,
        });
        
        node_id
    }
    
    /// Spawns a node near `center` with a random heading and the given speed.
    pub fn spawn_random(&mut self, center: TrackPoint, speed_mps: f64, jitter_std_m: f64, dropout_rate: f64) -> String {
        let north = self.rng.gen_range(-2_000.0..2_000.0);
        let east = self.rng.gen_range(-2_000.0..2_000.0);
        let heading: f64 = self.rng.gen_range(0.0..std::f64::consts::TAU);
        let velocity = (speed_mps * heading.cos(), speed_mps * heading.sin());
        
        self.spawn_node(offset_meters(center, north, east), velocity, jitter_std_m, dropout_rate)
    }
    
    /// Advances kinematics by dt seconds.
    pub fn step(&mut self, dt: f64) {
        self.current_time += dt;
        
        for node in &mut self.nodes {
            let (north, east) = node.velocity_mps;
            node.position = offset_meters(node.position, north * dt, east * dt);
            node.battery = (node.battery - 0.01 * dt).max(0.0);
        }
    }
    
    /// Returns the current simulation time.
    pub fn time(&self) -> f64 {
        self.current_time
    }
    
    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }
    
    /// Generates one report per node.
    ///
    /// Dropped fixes are reported the way the mesh does it: `gps = false`
    /// with both coordinates zeroed.
    pub fn reports(&mut self, timestamp: f64) -> Vec<NodeReport> {
        let mut reports = Vec::with_capacity(self.nodes.len());
        
        for node in &self.nodes {
            let dropped = self.rng.gen_bool(node.dropout_rate);
            
            let mut report = if dropped {
                NodeReport::new(node.node_id.clone(), false, 0.0, 0.0)
            } else {
                let (north, east) = match &node.jitter {
                    Some(normal) => (normal.sample(&mut self.rng), normal.sample(&mut self.rng)),
                    None => (0.0, 0.0),
                };
                let fix = offset_meters(node.position, north, east);
                NodeReport::new(node.node_id.clone(), true, round7(fix.lat), round7(fix.lng))
            };
            
            report.name = Some(format!("Sim {}", &node.node_id[1..]));
            report.short_name = Some(node.node_id[node.node_id.len() - 4..].to_string());
            report.hardware = Some("SIM".to_string());
            report.battery = Some(node.battery.round());
            report.voltage = Some(3.3 + node.battery / 100.0 * 0.9);
            report.snr = Some(self.rng.gen_range(-15.0..10.0));
            report.hops_away = Some(self.rng.gen_range(0..4));
            report.last_heard = Some(timestamp);
            report.timestamp = Some(timestamp);
            
            reports.push(report);
        }
        
        reports
    }
    
    /// Builds the poller's per-cycle summary for a batch of reports.
    pub fn summary(&mut self, cycle: u64, timestamp: f64, reports: &[NodeReport]) -> Summary {
        let mut changed = 0;
        for report in reports {
            let coords = (report.latitude, report.longitude);
            if self.last_reported.insert(report.node_id.clone(), coords) != Some(coords) {
                changed += 1;
            }
        }
        
        Summary {
            total_nodes: reports.len() as u64,
            gps_nodes: reports.iter().filter(|r| r.is_positionally_usable()).count() as u64,
            changed,
            timestamp,
            cycle,
            extra: Map::new(),
        }
    }
}

/// Rounds degrees to 1e-7, the resolution the mesh firmware reports.
fn round7(deg: f64) -> f64 {
    (deg * 1e7).round() / 1e7
}

#[cfg(test)]
mod tests {
    use super::*;
    use airsea_core::haversine_distance;
    use approx::assert_relative_eq;
    
    #[test]
    fn test_oracle_spawn_node() {
        let mut oracle = FleetOracle::new(42);
        let id = oracle.spawn_node(DEFAULT_CENTER, (0.0, 0.0), 0.0, 0.0);
        
        assert_eq!(id, "!00001000");
        assert_eq!(oracle.nodes().len(), 1);
        assert_eq!(oracle.nodes()[0].position, DEFAULT_CENTER);
    }
    
    #[test]
    fn test_oracle_step_moves_north() {
        let mut oracle = FleetOracle::new(42);
        oracle.spawn_node(DEFAULT_CENTER, (20.0, 0.0), 0.0, 0.0);
        
        oracle.step(1.0);
        
        let node = &oracle.nodes()[0];
        let moved = haversine_distance(DEFAULT_CENTER.lat, DEFAULT_CENTER.lng, node.position.lat, node.position.lng);
        assert_relative_eq!(moved, 20.0, epsilon = 1e-6);
        assert!(node.position.lat > DEFAULT_CENTER.lat);
    }
    
    #[test]
    fn test_noiseless_reports_are_exact() {
        let mut oracle = FleetOracle::new(1);
        oracle.spawn_node(DEFAULT_CENTER, (0.0, 0.0), 0.0, 0.0);
        
        let reports = oracle.reports(100.0);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].gps);
        assert_eq!(reports[0].latitude, DEFAULT_CENTER.lat);
        assert_eq!(reports[0].longitude, DEFAULT_CENTER.lng);
    }
    
    #[test]
    fn test_full_dropout() {
        let mut oracle = FleetOracle::new(1);
        oracle.spawn_node(DEFAULT_CENTER, (0.0, 0.0), 1.0, 1.0);
        
        let report = &oracle.reports(0.0)[0];
        assert!(!report.gps);
        assert_eq!((report.latitude, report.longitude), (0.0, 0.0));
    }
    
    #[test]
    fn test_deterministic_noise() {
        let mut oracle1 = FleetOracle::new(42);
        let mut oracle2 = FleetOracle::new(42);
        oracle1.spawn_node(DEFAULT_CENTER, (0.0, 0.0), 3.0, 0.2);
        oracle2.spawn_node(DEFAULT_CENTER, (0.0, 0.0), 3.0, 0.2);
        
        // Same seed = same noise
        assert_eq!(oracle1.reports(0.0), oracle2.reports(0.0));
    }
    
    #[test]
    fn test_summary_counts_changes() {
        let mut oracle = FleetOracle::new(3);
        oracle.spawn_node(DEFAULT_CENTER, (0.0, 0.0), 0.0, 0.0);
        oracle.spawn_node(DEFAULT_CENTER, (10.0, 0.0), 0.0, 0.0);
        
        let first = oracle.reports(0.0);
        let summary = oracle.summary(1, 0.0, &first);
        assert_eq!((summary.total_nodes, summary.gps_nodes, summary.changed), (2, 2, 2));
        
        oracle.step(5.0);
        let second = oracle.reports(5.0);
        let summary = oracle.summary(2, 5.0, &second);
        assert_eq!(summary.changed, 1);
        assert_eq!(summary.cycle, 2);
    }
}
