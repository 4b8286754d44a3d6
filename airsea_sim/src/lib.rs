//! AirSea Deterministic Simulation Harness
//!
//! Runs the real ingest runtime and reconciliation engine against a
//! synthetic fleet whose every random choice derives from one 64-bit seed.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ScenarioRunner                         │
//! │  ┌──────────────────┐  JSON   ┌──────────────────────────┐  │
//! │  │   FleetOracle    │────────►│ ChannelTransport         │  │
//! │  │ (ground truth,   │ reports │  airsea/base/nodes/<id>  │  │
//! │  │  noise, dropout) │ summary │  airsea/base/summary     │  │
//! │  └──────────────────┘         └────────────┬─────────────┘  │
//! │                                            │                │
//! │  ┌──────────────────┐         ┌────────────▼─────────────┐  │
//! │  │   SimContext     │────────►│ IngestRuntime            │  │
//! │  │ (virtual clock)  │         │  └─ ReconcileEngine      │  │
//! │  └──────────────────┘         └────────────┬─────────────┘  │
//! │                                            ▼                │
//! │                        invariant checks on final Snapshot   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use airsea_sim::{ScenarioRunner, ScenarioId};
//!
//! let result = ScenarioRunner::new(42, 8).run(ScenarioId::LongHaul);
//! assert!(result.passed);
//! ```

mod context;
mod error;
mod exporter;
mod oracle;
mod runner;
pub mod scenarios;

pub use context::SimContext;
pub use error::SimError;
pub use exporter::SimExport;
pub use oracle::{offset_meters, FleetOracle, SimNode, DEFAULT_CENTER};
pub use runner::{check_invariants, ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use scenarios::ScenarioId;
