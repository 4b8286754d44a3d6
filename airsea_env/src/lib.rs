//! AirSea Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" boundary between the AirSea tracking
//! engine and the outside world, so the same ingest code runs against a
//! live broker bridge in **Production** and a virtual clock in **Simulation**.
//!
//! # What is intercepted
//!
//! - Time (`now()`, `system_time()`, `sleep()`)
//! - Pub/sub delivery (`subscribe()`, `recv()`, connection status)
//!
//! The engine never opens sockets or parses wire bytes itself; it is handed
//! already-routed [`InboundMessage`]s by a [`MessageTransport`].
//!
//! # Example
//!
//! ```ignore
//! use airsea_env::{ChannelTransport, MessageTransport, NODE_TOPIC_FILTER};
//!
//! let (transport, publisher) = ChannelTransport::pair(1024);
//! transport.subscribe(NODE_TOPIC_FILTER).await?;
//! publisher.publish("airsea/base/nodes/!a1b2c3", br#"{...}"#.to_vec()).await?;
//! while let Some(msg) = transport.recv().await {
//!     handle(msg);
//! }
//! ```

mod channel;
mod context;
mod error;
mod tokio_impl;
mod topic;
mod transport;
mod types;

pub use channel::{ChannelPublisher, ChannelTransport};
pub use context::IngestContext;
pub use error::EnvError;
pub use tokio_impl::TokioContext;
pub use topic::{topic_matches, validate_filter, Topic, NODE_TOPIC_FILTER, NODE_TOPIC_PREFIX, SUMMARY_TOPIC};
pub use transport::MessageTransport;
pub use types::{ConnectionStatus, InboundMessage};
