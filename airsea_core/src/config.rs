//! Tracking configuration.

use crate::error::ConfigError;
use crate::geodesy::EARTH_RADIUS_M;
use serde::{Deserialize, Serialize};

/// Configuration for the track builder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// A new point is appended only if it lies strictly farther than this
    /// from the last track point (default: 10 m). The comparison is against
    /// the computed haversine distance, so the boundary holds to within
    /// floating-point rounding of that computation.
    pub movement_threshold_m: f64,
    
    /// Maximum points kept per track; oldest evicted first (default: 200)
    pub max_track_points: usize,
    
    /// Sphere radius for haversine distance (default: 6,371,000 m)
    pub earth_radius_m: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            movement_threshold_m: 10.0,
            max_track_points: 200,
            earth_radius_m: EARTH_RADIUS_M,
        }
    }
}

impl TrackingConfig {
    /// Rejects values the builder cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.movement_threshold_m.is_finite() || self.movement_threshold_m < 0.0 {
            return Err(ConfigError::InvalidThreshold(self.movement_threshold_m));
        }
        if self.max_track_points == 0 {
            return Err(ConfigError::InvalidTrackLength(self.max_track_points));
        }
        if !self.earth_radius_m.is_finite() || self.earth_radius_m <= 0.0 {
            return Err(ConfigError::InvalidEarthRadius(self.earth_radius_m));
        }
        Ok(())
    }
}
