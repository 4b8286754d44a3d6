//! AirSea Core - Streaming Track Reconciliation
//!
//! This library turns a stream of per-node location reports into a live,
//! bounded movement history per node:
//! 1. **Jitter Problem**: GPS noise below the movement threshold never becomes a track point
//! 2. **Memory Problem**: every track is a FIFO bounded at `max_track_points`
//! 3. **Reader Problem**: copy-on-write snapshots let renderers read while ingest writes

pub mod config;
pub mod error;
pub mod geodesy;
pub mod ingest;
pub mod reconcile;
pub mod report;
pub mod snapshot;
pub mod store;
pub mod track;

// Re-export key types for convenience
pub use config::TrackingConfig;
pub use error::{ConfigError, IngestError};
pub use geodesy::{haversine_distance, EARTH_RADIUS_M};
pub use ingest::{Handled, IngestConfig, IngestRuntime, IngestStats};
pub use reconcile::{ReconcileEngine, ReconcileOutcome, ReconcileStats, TrackAction};
pub use report::{NodeReport, Summary};
pub use snapshot::{FleetStats, Snapshot};
pub use store::{NodeMap, NodeStore};
pub use track::{Track, TrackBook, TrackMap, TrackPoint, TrackUpdate};
