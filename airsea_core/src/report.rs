//! Wire types published by the upstream node poller.
//!
//! Both types keep unrecognised JSON fields in `extra` so they can be handed
//! to presentation code unchanged.

use crate::track::TrackPoint;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// NODE REPORT
// ============================================================================

/// One telemetry report for one node, as published on `airsea/base/nodes/<id>`.
///
/// Only `node_id`, `gps`, `latitude` and `longitude` drive tracking; the
/// remaining telemetry is opaque payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeReport {
    /// Opaque node identifier, stable across reports (e.g. `"!a1b2c3"`)
    pub node_id: String,
    
    /// Fix-validity flag reported by the node
    pub gps: bool,
    
    /// Latitude in degrees; `0` means "no fix"
    pub latitude: f64,
    
    /// Longitude in degrees; `0` means "no fix"
    pub longitude: f64,
    
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware: Option<String>,
    
    /// Battery level in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<f64>,
    
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snr: Option<f64>,
    
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hops_away: Option<u32>,
    
    /// Unix seconds when the mesh last heard the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heard: Option<f64>,
    
    /// Altitude in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    
    /// Unix seconds when the poller sampled the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    
    /// Poller's publish time, free-form string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pushed_at: Option<String>,
    
    /// Any fields not listed above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeReport {
    /// Creates a report carrying only the fields tracking looks at.
    pub fn new(node_id: impl Into<String>, gps: bool, latitude: f64, longitude: f64) -> Self {
        Self {
            node_id: node_id.into(),
            gps,
            latitude,
            longitude,
            name: None,
            short_name: None,
            hardware: None,
            battery: None,
            voltage: None,
            snr: None,
            hops_away: None,
            last_heard: None,
            altitude: None,
            timestamp: None,
            pushed_at: None,
            extra: Map::new(),
        }
    }
    
    /// A report is positionally usable only with a GPS fix and two non-zero coordinates.
    #[inline]
    pub fn is_positionally_usable(&self) -> bool {
        self.gps && self.latitude != 0.0 && self.longitude != 0.0
    }
    
    /// The report's position, if usable.
    pub fn position(&self) -> Option<TrackPoint> {
        if self.is_positionally_usable() {
            Some(TrackPoint::new(self.latitude, self.longitude))
        } else {
            None
        }
    }
    
    /// True when latitude and longitude both compare equal to `other`'s.
    #[inline]
    pub fn same_coordinates(&self, other: &NodeReport) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }
}

// ============================================================================
// SUMMARY
// ============================================================================

/// Per-cycle fleet summary published on `airsea/base/summary`.
///
/// Stored and exposed verbatim; nothing in the engine reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_nodes: u64,
    pub gps_nodes: u64,
    pub changed: u64,
    pub timestamp: f64,
    pub cycle: u64,
    
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_decode_full_report() {
        let json = r#"{
            "node_id": "!a1b2c3",
            "name": "Buoy 7",
            "short_name": "B7",
            "hardware": "TBEAM",
            "battery": 87,
            "voltage": 4.02,
            "snr": -7.5,
            "hops_away": 2,
            "last_heard": 1718000000,
            "gps": true,
            "latitude": -6.2,
            "longitude": 106.8,
            "altitude": 12,
            "timestamp": 1718000005,
            "pushed_at": "2024-06-10T06:13:25Z",
            "channel": 3
        }"#;
        
        let report: NodeReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.node_id, "!a1b2c3");
        assert_eq!(report.battery, Some(87.0));
        assert_eq!(report.hops_away, Some(2));
        assert_eq!(report.extra.get("channel"), Some(&Value::from(3)));
        assert!(report.is_positionally_usable());
    }
    
    #[test]
    fn test_decode_minimal_report() {
        let json = r#"{"node_id":"n1","gps":false,"latitude":0,"longitude":0}"#;
        let report: NodeReport = serde_json::from_str(json).unwrap();
        assert_eq!(report, NodeReport::new("n1", false, 0.0, 0.0));
        assert_eq!(report.position(), None);
    }
    
    #[test]
    fn test_missing_position_fields_fail_to_decode() {
        let json = r#"{"node_id":"n1","gps":true,"latitude":-6.2}"#;
        assert!(serde_json::from_str::<NodeReport>(json).is_err());
    }
    
    #[test]
    fn test_usability_rules() {
        assert!(NodeReport::new("n", true, -6.2, 106.8).is_positionally_usable());
        assert!(!NodeReport::new("n", false, -6.2, 106.8).is_positionally_usable());
        assert!(!NodeReport::new("n", true, 0.0, 106.8).is_positionally_usable());
        assert!(!NodeReport::new("n", true, -6.2, 0.0).is_positionally_usable());
        assert!(!NodeReport::new("n", true, -0.0, 106.8).is_positionally_usable());
    }
    
    #[test]
    fn test_summary_passthrough() {
        let json = r#"{"total_nodes":12,"gps_nodes":5,"changed":3,"timestamp":1718000000.5,"cycle":42,"source":"poller-1"}"#;
        let summary: Summary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.cycle, 42);
        assert_eq!(summary.extra.get("source"), Some(&Value::from("poller-1")));
        
        let back: Value = serde_json::to_value(&summary).unwrap();
        let original: Value = serde_json::from_str(json).unwrap();
        assert_eq!(back, original);
    }
}
