//! Error types for the simulation harness.

use airsea_core::{ConfigError, IngestError};
use airsea_env::EnvError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    
    #[error(transparent)]
    Env(#[from] EnvError),
    
    #[error(transparent)]
    Ingest(#[from] IngestError),
    
    #[error("invalid tracking config: {0}")]
    Config(#[from] ConfigError),
    
    #[error("ingest task failed: {0}")]
    Join(String),
}
