//! In-process channel transport.
//!
//! Used directly by the simulation harness and as the landing point for a
//! broker bridge in production: the bridge owns the socket and pushes
//! decoded frames through a [`ChannelPublisher`].

use async_trait::async_trait;
use crate::error::EnvError;
use crate::topic::{topic_matches, validate_filter};
use crate::transport::MessageTransport;
use crate::types::{ConnectionStatus, InboundMessage};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::trace;

/// Receiving side of an in-process pub/sub link.
pub struct ChannelTransport {
    /// Incoming messages (behind tokio mutex for async)
    rx: Mutex<mpsc::Receiver<InboundMessage>>,
    
    /// Active subscription filters
    filters: RwLock<Vec<String>>,
    
    /// Cleared once the publishing side has gone away
    connected: AtomicBool,
}

/// Publishing side of an in-process pub/sub link.
///
/// Cloneable; the transport closes when every publisher is dropped.
#[derive(Clone)]
pub struct ChannelPublisher {
    tx: mpsc::Sender<InboundMessage>,
}

impl ChannelTransport {
    /// Creates a connected transport/publisher pair with a bounded buffer.
    pub fn pair(capacity: usize) -> (ChannelTransport, ChannelPublisher) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let transport = ChannelTransport {
            rx: Mutex::new(rx),
            filters: RwLock::new(Vec::new()),
            connected: AtomicBool::new(true),
        };
        
        (transport, ChannelPublisher { tx })
    }
    
    /// Returns the currently active filters.
    pub async fn filters(&self) -> Vec<String> {
        self.filters.read().await.clone()
    }
    
    async fn accepts(&self, topic: &str) -> bool {
        self.filters
            .read()
            .await
            .iter()
            .any(|filter| topic_matches(filter, topic))
    }
}

#[async_trait]
impl MessageTransport for ChannelTransport {
    async fn subscribe(&self, filter: &str) -> Result<(), EnvError> {
        validate_filter(filter)?;
        if !self.connected.load(Ordering::SeqCst) {
            return Err(EnvError::Subscribe(format!("{}: transport disconnected", filter)));
        }
        
        let mut filters = self.filters.write().await;
        if !filters.iter().any(|f| f == filter) {
            filters.push(filter.to_string());
        }
        Ok(())
    }
    
    async fn recv(&self) -> Option<InboundMessage> {
        let mut rx = self.rx.lock().await;
        
        loop {
            match rx.recv().await {
                Some(msg) => {
                    if self.accepts(&msg.topic).await {
                        return Some(msg);
                    }
                    trace!(topic = %msg.topic, "dropping message with no matching subscription");
                }
                None => {
                    self.connected.store(false, Ordering::SeqCst);
                    return None;
                }
            }
        }
    }
    
    fn status(&self) -> ConnectionStatus {
        if self.connected.load(Ordering::SeqCst) {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }
}

impl ChannelPublisher {
    /// Publishes a payload on a topic.
    ///
    /// Waits for buffer space; fails only when the transport was dropped.
    pub async fn publish(&self, topic: impl Into<String>, payload: Vec<u8>) -> Result<(), EnvError> {
        self.tx
            .send(InboundMessage::new(topic, payload))
            .await
            .map_err(|_| EnvError::closed("receiver dropped"))
    }
    
    /// Returns true if the receiving transport has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::{NODE_TOPIC_FILTER, SUMMARY_TOPIC};
    
    #[tokio::test]
    async fn test_delivers_matching_topics_in_order() {
        let (transport, publisher) = ChannelTransport::pair(8);
        transport.subscribe(NODE_TOPIC_FILTER).await.unwrap();
        
        publisher.publish("airsea/base/nodes/a", b"1".to_vec()).await.unwrap();
        publisher.publish("airsea/base/nodes/b", b"2".to_vec()).await.unwrap();
        drop(publisher);
        
        let first = transport.recv().await.unwrap();
        let second = transport.recv().await.unwrap();
        assert_eq!(first.topic, "airsea/base/nodes/a");
        assert_eq!(second.payload, b"2".to_vec());
        assert!(transport.recv().await.is_none());
    }
    
    #[tokio::test]
    async fn test_drops_unsubscribed_topics() {
        let (transport, publisher) = ChannelTransport::pair(8);
        transport.subscribe(SUMMARY_TOPIC).await.unwrap();
        
        publisher.publish("airsea/base/nodes/a", b"x".to_vec()).await.unwrap();
        publisher.publish(SUMMARY_TOPIC, b"y".to_vec()).await.unwrap();
        drop(publisher);
        
        let msg = transport.recv().await.unwrap();
        assert_eq!(msg.topic, SUMMARY_TOPIC);
        assert!(transport.recv().await.is_none());
    }
    
    #[tokio::test]
    async fn test_subscribe_after_close_fails() {
        let (transport, publisher) = ChannelTransport::pair(1);
        drop(publisher);
        assert!(transport.recv().await.is_none());
        
        let err = transport.subscribe(SUMMARY_TOPIC).await.unwrap_err();
        assert!(matches!(err, EnvError::Subscribe(_)));
        assert!(transport.filters().await.is_empty());
    }
    
    #[tokio::test]
    async fn test_status_flips_on_close() {
        let (transport, publisher) = ChannelTransport::pair(1);
        assert_eq!(transport.status(), ConnectionStatus::Connected);
        
        drop(publisher);
        assert!(transport.recv().await.is_none());
        assert_eq!(transport.status(), ConnectionStatus::Disconnected);
    }
    
    #[tokio::test]
    async fn test_subscribe_rejects_bad_filter_and_dedupes() {
        let (transport, _publisher) = ChannelTransport::pair(1);
        assert!(transport.subscribe("airsea/#/x").await.is_err());
        
        transport.subscribe(NODE_TOPIC_FILTER).await.unwrap();
        transport.subscribe(NODE_TOPIC_FILTER).await.unwrap();
        assert_eq!(transport.filters().await, vec![NODE_TOPIC_FILTER.to_string()]);
    }
    
    #[tokio::test]
    async fn test_publish_after_transport_dropped() {
        let (transport, publisher) = ChannelTransport::pair(1);
        drop(transport);
        
        assert!(publisher.is_closed());
        let err = publisher.publish(SUMMARY_TOPIC, vec![]).await.unwrap_err();
        assert!(matches!(err, EnvError::TransportClosed(_)));
    }
}
