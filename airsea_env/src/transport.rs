//! Pub/sub transport abstraction for AirSea ingest.

use async_trait::async_trait;
use crate::error::EnvError;
use crate::types::{ConnectionStatus, InboundMessage};

/// Abstraction for the publish/subscribe link feeding the ingest runtime.
///
/// # Implementations
///
/// - **Production**: a broker bridge (MQTT over WebSocket) pushing into a
///   `ChannelTransport`
/// - **Simulation**: `ChannelTransport` fed directly by the fleet oracle
///
/// # Message Flow
///
/// ```text
/// Poller                     Broker                    Ingest
///   |                           |                          |
///   |-- publish(topic, json) -->|                          |
///   |                           |-- [filter match] ------->|
///   |                           |                          |-- recv() -> message
/// ```
///
/// Connection loss, reconnect backoff and payload framing all live behind
/// this trait; the ingest runtime only ever sees whole messages, in order.
#[async_trait]
pub trait MessageTransport: Send + Sync + 'static {
    /// Registers interest in a topic filter (`+` / `#` wildcards allowed).
    ///
    /// # Returns
    /// * `Ok(())` - Subscription active; matching messages will be delivered
    /// * `Err(EnvError::InvalidTopic)` - Malformed filter
    async fn subscribe(&self, filter: &str) -> Result<(), EnvError>;
    
    /// Receives the next message matching any active subscription.
    ///
    /// # Returns
    /// * `Some(message)` - A message was received
    /// * `None` - The transport was closed (shutdown)
    async fn recv(&self) -> Option<InboundMessage>;
    
    /// Returns the current link state.
    fn status(&self) -> ConnectionStatus;
}
