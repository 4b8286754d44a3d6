//! Error types for configuration and message ingest.
//!
//! Reconciliation itself is total and has no error type.

use airsea_env::EnvError;
use thiserror::Error;

/// Errors raised while turning transport messages into engine input.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to decode payload on {topic}: {source}")]
    Decode {
        topic: String,
        #[source]
        source: serde_json::Error,
    },
    
    #[error("No route for topic: {0}")]
    UnroutableTopic(String),
    
    #[error(transparent)]
    Env(#[from] EnvError),
}

/// Errors raised by [`crate::TrackingConfig::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Movement threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(f64),
    
    #[error("Maximum track length must be at least 1, got {0}")]
    InvalidTrackLength(usize),
    
    #[error("Earth radius must be finite and positive, got {0}")]
    InvalidEarthRadius(f64),
}
