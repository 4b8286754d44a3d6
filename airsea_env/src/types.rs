//! Common types for the AirSea environment abstraction.

use serde::{Deserialize, Serialize};

/// A message as delivered by the pub/sub transport.
///
/// This is a transport-layer wrapper - the payload is opaque bytes that
/// will be decoded by the ingest layer according to its topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Topic the message was published on
    pub topic: String,
    
    /// The raw payload bytes
    pub payload: Vec<u8>,
}

impl InboundMessage {
    /// Creates a new message from a topic and payload.
    pub fn new(topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
    
    /// Returns the payload as text, replacing invalid UTF-8 sequences.
    pub fn payload_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
    
    /// Returns the payload size in bytes.
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

/// Link state of a transport, as shown by the client status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    /// Returns true when the transport can still deliver messages.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
        }
    }
}
