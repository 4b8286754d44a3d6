//! The Node State Store - latest report per node, last write wins.

use crate::report::NodeReport;
use std::collections::HashMap;
use std::sync::Arc;

/// Latest report keyed by node id.
pub type NodeMap = HashMap<String, Arc<NodeReport>>;

/// Holds exactly one report per node; entries are replaced whole and never removed.
///
/// Like [`crate::TrackBook`], the map is shared copy-on-write with snapshot readers.
#[derive(Debug, Clone, Default)]
pub struct NodeStore {
    nodes: Arc<NodeMap>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Latest report for `node_id`.
    pub fn get(&self, node_id: &str) -> Option<&NodeReport> {
        self.nodes.get(node_id).map(|report| report.as_ref())
    }
    
    /// Replace the stored report for the report's node, returning the old one.
    ///
    /// No timestamp ordering is applied: whatever arrives last is kept.
    pub fn upsert(&mut self, report: NodeReport) -> Option<Arc<NodeReport>> {
        let node_id = report.node_id.clone();
        Arc::make_mut(&mut self.nodes).insert(node_id, Arc::new(report))
    }
    
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    
    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }
    
    /// Immutable view of the current mapping.
    pub fn snapshot(&self) -> Arc<NodeMap> {
        Arc::clone(&self.nodes)
    }
}
