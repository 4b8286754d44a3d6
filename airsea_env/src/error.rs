//! Error types for the AirSea environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The other end of the transport went away
    #[error("Transport closed: {0}")]
    TransportClosed(String),
    
    /// Subscription request was rejected
    #[error("Subscribe failed: {0}")]
    Subscribe(String),
    
    /// Topic or topic filter is not well-formed
    #[error("Invalid topic: {0}")]
    InvalidTopic(String),
}

impl EnvError {
    /// Creates a transport-closed error.
    pub fn closed(msg: impl Into<String>) -> Self {
        Self::TransportClosed(msg.into())
    }
    
    /// Creates an invalid-topic error.
    pub fn invalid_topic(topic: impl std::fmt::Display) -> Self {
        Self::InvalidTopic(topic.to_string())
    }
}
