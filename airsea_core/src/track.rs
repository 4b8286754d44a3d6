//! The Track Builder - bounded, jitter-filtered movement history per node.
//!
//! A track only grows when a new fix lies strictly farther than the movement
//! threshold from the **last track point**. Reports in between are dropped
//! but the anchor stays put, so a slow drift made of many sub-threshold steps
//! adds up against it and is recorded once its total clears the threshold.

use crate::config::TrackingConfig;
use crate::error::ConfigError;
use crate::geodesy::haversine_distance_with_radius;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

// ============================================================================
// TRACK POINT
// ============================================================================

/// A (latitude, longitude) pair in degrees, serialized as `[lat, lng]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct TrackPoint {
    pub lat: f64,
    pub lng: f64,
}

impl TrackPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
    
    /// Great-circle distance to `other` on a sphere of `radius` meters.
    #[inline]
    pub fn distance_to(&self, other: &TrackPoint, radius: f64) -> f64 {
        haversine_distance_with_radius(self.lat, self.lng, other.lat, other.lng, radius)
    }
}

impl From<(f64, f64)> for TrackPoint {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

impl From<TrackPoint> for (f64, f64) {
    fn from(point: TrackPoint) -> Self {
        (point.lat, point.lng)
    }
}

// ============================================================================
// TRACK
// ============================================================================

/// Ordered points for one node, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Track {
    points: VecDeque<TrackPoint>,
}

impl Track {
    /// Starts a track at its first point.
    pub fn new(first: TrackPoint) -> Self {
        let mut points = VecDeque::new();
        points.push_back(first);
        Self { points }
    }
    
    pub fn len(&self) -> usize {
        self.points.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    
    /// Most recent point.
    pub fn last(&self) -> Option<&TrackPoint> {
        self.points.back()
    }
    
    /// Oldest retained point.
    pub fn first(&self) -> Option<&TrackPoint> {
        self.points.front()
    }
    
    pub fn iter(&self) -> impl Iterator<Item = &TrackPoint> {
        self.points.iter()
    }
    
    /// Points as a plain vector, oldest first.
    pub fn to_vec(&self) -> Vec<TrackPoint> {
        self.points.iter().copied().collect()
    }
    
    /// Appends a point and evicts the oldest one if the track now exceeds
    /// `max_points`. Returns the evicted point.
    pub fn push_bounded(&mut self, point: TrackPoint, max_points: usize) -> Option<TrackPoint> {
        self.points.push_back(point);
        if self.points.len() > max_points {
            self.points.pop_front()
        } else {
            None
        }
    }
}

// ============================================================================
// TRACK UPDATE (Output)
// ============================================================================

/// What the builder did with one candidate point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackUpdate {
    /// New single-point track
    Created,
    
    /// Initialization requested for a node that already has a track; nothing changed
    AlreadyTracked,
    
    /// Point appended; `evicted` is the point dropped off the front, if any
    Appended {
        distance_m: f64,
        evicted: Option<TrackPoint>,
    },
    
    /// Point within the movement threshold of the last track point; discarded
    Suppressed { distance_m: f64 },
}

impl TrackUpdate {
    /// True if the track collection changed.
    pub fn is_mutation(&self) -> bool {
        matches!(self, TrackUpdate::Created | TrackUpdate::Appended { .. })
    }
}

// ============================================================================
// TRACK BOOK
// ============================================================================

/// Track collection keyed by node id.
pub type TrackMap = HashMap<String, Arc<Track>>;

/// Owns every node's track.
///
/// The map and each track sit behind `Arc`s. Mutation goes through
/// `Arc::make_mut`, so a map or track that a reader still holds is cloned
/// before it is changed and the reader's copy never moves.
#[derive(Debug, Clone, Default)]
pub struct TrackBook {
    tracks: Arc<TrackMap>,
    config: TrackingConfig,
}

impl TrackBook {
    /// Create an empty book with the given configuration.
    ///
    /// Fails if the configuration cannot keep the spacing or length bounds
    /// (non-finite threshold, zero track length, bad radius).
    pub fn new(config: TrackingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        
        Ok(Self {
            tracks: Arc::new(HashMap::new()),
            config,
        })
    }
    
    /// Create an empty book with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            tracks: Arc::new(HashMap::new()),
            config: TrackingConfig::default(),
        }
    }
    
    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }
    
    /// Start a single-point track for `node_id`.
    ///
    /// Idempotent: an existing track is left untouched.
    pub fn initialize_track(&mut self, node_id: &str, point: TrackPoint) -> TrackUpdate {
        if self.tracks.contains_key(node_id) {
            return TrackUpdate::AlreadyTracked;
        }
        
        Arc::make_mut(&mut self.tracks).insert(node_id.to_string(), Arc::new(Track::new(point)));
        TrackUpdate::Created
    }
    
    /// Offer a new fix for `node_id`.
    ///
    /// Creates the track if missing; otherwise appends only when the fix is
    /// strictly farther than the movement threshold from the last track point.
    pub fn update_track(&mut self, node_id: &str, point: TrackPoint) -> TrackUpdate {
        let last = match self.tracks.get(node_id).and_then(|track| track.last().copied()) {
            Some(last) => last,
            None => return self.initialize_track(node_id, point),
        };
        
        let distance_m = last.distance_to(&point, self.config.earth_radius_m);
        if distance_m <= self.config.movement_threshold_m {
            return TrackUpdate::Suppressed { distance_m };
        }
        
        let max_points = self.config.max_track_points;
        let evicted = Arc::make_mut(&mut self.tracks)
            .get_mut(node_id)
            .and_then(|track| Arc::make_mut(track).push_bounded(point, max_points));
        
        TrackUpdate::Appended { distance_m, evicted }
    }
    
    /// Get a node's track.
    pub fn get(&self, node_id: &str) -> Option<&Track> {
        self.tracks.get(node_id).map(|track| track.as_ref())
    }
    
    /// Number of tracked nodes.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
    
    /// Total points across all tracks.
    pub fn total_points(&self) -> usize {
        self.tracks.values().map(|track| track.len()).sum()
    }
    
    /// Immutable view of the current collection.
    pub fn snapshot(&self) -> Arc<TrackMap> {
        Arc::clone(&self.tracks)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::EARTH_RADIUS_M;
    
    const NODE: &str = "!a1b2c3";
    
    /// Point `meters` due north of (lat, lng).
    fn north_of(lat: f64, lng: f64, meters: f64) -> TrackPoint {
        TrackPoint::new(lat + (meters / EARTH_RADIUS_M).to_degrees(), lng)
    }
    
    fn origin() -> TrackPoint {
        TrackPoint::new(-6.2000, 106.8000)
    }
    
    #[test]
    fn test_initialize_creates_single_point() {
        let mut book = TrackBook::with_defaults();
        assert_eq!(book.initialize_track(NODE, origin()), TrackUpdate::Created);
        
        let track = book.get(NODE).unwrap();
        assert_eq!(track.to_vec(), vec![origin()]);
    }
    
    #[test]
    fn test_initialize_is_idempotent() {
        let mut once = TrackBook::with_defaults();
        once.initialize_track(NODE, origin());
        
        let mut twice = TrackBook::with_defaults();
        twice.initialize_track(NODE, origin());
        assert_eq!(twice.initialize_track(NODE, origin()), TrackUpdate::AlreadyTracked);
        
        assert_eq!(once.get(NODE), twice.get(NODE));
    }
    
    #[test]
    fn test_initialize_does_not_overwrite() {
        let mut book = TrackBook::with_defaults();
        book.initialize_track(NODE, origin());
        book.initialize_track(NODE, TrackPoint::new(1.0, 1.0));
        
        assert_eq!(book.get(NODE).unwrap().to_vec(), vec![origin()]);
    }
    
    #[test]
    fn test_update_without_track_initializes() {
        let mut book = TrackBook::with_defaults();
        assert_eq!(book.update_track(NODE, origin()), TrackUpdate::Created);
        assert_eq!(book.get(NODE).unwrap().len(), 1);
    }
    
    #[test]
    fn test_threshold_just_above_appends() {
        let mut book = TrackBook::with_defaults();
        book.initialize_track(NODE, origin());
        
        let next = north_of(origin().lat, origin().lng, 10.1);
        let update = book.update_track(NODE, next);
        
        assert!(matches!(update, TrackUpdate::Appended { evicted: None, .. }));
        assert_eq!(book.get(NODE).unwrap().last(), Some(&next));
    }
    
    #[test]
    fn test_threshold_just_below_suppresses() {
        let mut book = TrackBook::with_defaults();
        book.initialize_track(NODE, origin());
        
        let update = book.update_track(NODE, north_of(origin().lat, origin().lng, 9.99));
        
        assert!(matches!(update, TrackUpdate::Suppressed { .. }));
        assert_eq!(book.get(NODE).unwrap().len(), 1);
    }
    
    #[test]
    fn test_distance_equal_to_threshold_is_suppressed() {
        let a = origin();
        let b = north_of(a.lat, a.lng, 10.0);
        let exact = a.distance_to(&b, EARTH_RADIUS_M);
        
        let config = TrackingConfig { movement_threshold_m: exact, ..Default::default() };
        let mut book = TrackBook::new(config).unwrap();
        book.initialize_track(NODE, a);
        
        assert_eq!(book.update_track(NODE, b), TrackUpdate::Suppressed { distance_m: exact });
        assert_eq!(book.get(NODE).unwrap().len(), 1);
    }
    
    #[test]
    fn test_default_threshold_boundary() {
        let config = TrackingConfig::default();
        let a = origin();
        
        // A nominal 10 m offset computes a hair over 10 m and is kept
        let over = north_of(a.lat, a.lng, 10.0);
        let mut book = TrackBook::with_defaults();
        book.initialize_track(NODE, a);
        match book.update_track(NODE, over) {
            TrackUpdate::Appended { distance_m, .. } => assert!(distance_m > config.movement_threshold_m),
            other => panic!("expected append, got {:?}", other),
        }
        
        // Nudge south until the computed distance is no longer above 10 m
        let mut meters = 10.0;
        while a.distance_to(&north_of(a.lat, a.lng, meters), EARTH_RADIUS_M) > config.movement_threshold_m {
            meters -= 1e-9;
        }
        let at = north_of(a.lat, a.lng, meters);
        let mut book = TrackBook::with_defaults();
        book.initialize_track(NODE, a);
        match book.update_track(NODE, at) {
            TrackUpdate::Suppressed { distance_m } => {
                assert!(distance_m <= config.movement_threshold_m);
                assert!(distance_m > config.movement_threshold_m - 1e-6);
            }
            other => panic!("expected suppression, got {:?}", other),
        }
    }
    
    #[test]
    fn test_new_rejects_invalid_config() {
        let nan = TrackingConfig { movement_threshold_m: f64::NAN, ..Default::default() };
        assert!(matches!(TrackBook::new(nan), Err(ConfigError::InvalidThreshold(_))));
        
        let empty = TrackingConfig { max_track_points: 0, ..Default::default() };
        assert_eq!(TrackBook::new(empty).err(), Some(ConfigError::InvalidTrackLength(0)));
        
        assert!(TrackBook::new(TrackingConfig::default()).is_ok());
    }
    
    #[test]
    fn test_measures_against_last_track_point() {
        let mut book = TrackBook::with_defaults();
        let anchor = origin();
        book.initialize_track(NODE, anchor);
        
        // Drift of 6 m then 3 m: both steps are compared with the anchor
        let step1 = north_of(anchor.lat, anchor.lng, 6.0);
        let step2 = north_of(anchor.lat, anchor.lng, 9.0);
        assert!(matches!(book.update_track(NODE, step1), TrackUpdate::Suppressed { .. }));
        assert!(matches!(book.update_track(NODE, step2), TrackUpdate::Suppressed { .. }));
        assert_eq!(book.get(NODE).unwrap().len(), 1);
        
        // Only 3 m from the previous fix, but 12 m from the anchor
        let step3 = north_of(anchor.lat, anchor.lng, 12.0);
        assert!(matches!(book.update_track(NODE, step3), TrackUpdate::Appended { .. }));
        assert_eq!(book.get(NODE).unwrap().len(), 2);
    }
    
    #[test]
    fn test_eviction_keeps_most_recent_points() {
        let mut book = TrackBook::with_defaults();
        let points: Vec<TrackPoint> = (0..250)
            .map(|i| TrackPoint::new(-6.2 + i as f64 * 0.001, 106.8))
            .collect();
        
        book.initialize_track(NODE, points[0]);
        let mut evicted = Vec::new();
        for point in &points[1..] {
            if let TrackUpdate::Appended { evicted: Some(old), .. } = book.update_track(NODE, *point) {
                evicted.push(old);
            }
        }
        
        let track = book.get(NODE).unwrap();
        assert_eq!(track.len(), 200);
        assert_eq!(track.to_vec(), points[50..].to_vec());
        assert_eq!(evicted, points[..50].to_vec());
    }
    
    #[test]
    fn test_snapshot_is_unaffected_by_later_updates() {
        let mut book = TrackBook::with_defaults();
        book.initialize_track(NODE, origin());
        let before = book.snapshot();
        
        book.update_track(NODE, TrackPoint::new(-6.2010, 106.8000));
        book.initialize_track("other", TrackPoint::new(1.0, 1.0));
        
        assert_eq!(before.len(), 1);
        assert_eq!(before[NODE].len(), 1);
        assert_eq!(book.get(NODE).unwrap().len(), 2);
        assert_eq!(book.len(), 2);
    }
    
    #[test]
    fn test_suppressed_update_keeps_same_map() {
        let mut book = TrackBook::with_defaults();
        book.initialize_track(NODE, origin());
        let before = book.snapshot();
        
        book.update_track(NODE, north_of(origin().lat, origin().lng, 1.0));
        assert!(Arc::ptr_eq(&before, &book.snapshot()));
    }
    
    #[test]
    fn test_track_point_serializes_as_pair() {
        let json = serde_json::to_string(&Track::new(TrackPoint::new(-6.2, 106.8))).unwrap();
        assert_eq!(json, "[[-6.2,106.8]]");
        
        let back: Track = serde_json::from_str(&json).unwrap();
        assert_eq!(back.first(), Some(&TrackPoint::new(-6.2, 106.8)));
    }
    
    #[test]
    fn test_total_points() {
        let mut book = TrackBook::with_defaults();
        book.initialize_track("a", TrackPoint::new(1.0, 1.0));
        book.initialize_track("b", TrackPoint::new(2.0, 2.0));
        book.update_track("b", TrackPoint::new(2.1, 2.0));
        assert_eq!(book.total_points(), 3);
    }
}
