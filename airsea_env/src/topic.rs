//! Topic grammar for the AirSea broker.
//!
//! Node reports are published one topic per node under
//! `airsea/base/nodes/<node_id>`; the upstream poller publishes a fleet
//! summary on `airsea/base/summary` once per cycle.

use crate::error::EnvError;

/// Prefix of every per-node report topic.
pub const NODE_TOPIC_PREFIX: &str = "airsea/base/nodes/";

/// Filter matching every per-node report topic.
pub const NODE_TOPIC_FILTER: &str = "airsea/base/nodes/+";

/// Topic carrying the per-cycle fleet summary.
pub const SUMMARY_TOPIC: &str = "airsea/base/summary";

/// A topic the ingest layer knows how to route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    /// Report for a single node; carries the topic's node segment
    Node(String),
    
    /// Fleet summary
    Summary,
}

impl Topic {
    /// Classifies a concrete topic string.
    ///
    /// Returns `None` for anything that is neither a single-level node topic
    /// nor the summary topic.
    pub fn classify(topic: &str) -> Option<Topic> {
        if topic == SUMMARY_TOPIC {
            return Some(Topic::Summary);
        }
        
        let id = topic.strip_prefix(NODE_TOPIC_PREFIX)?;
        if id.is_empty() || id.contains('/') {
            return None;
        }
        
        Some(Topic::Node(id.to_string()))
    }
    
    /// Builds the report topic for a node.
    pub fn node(node_id: &str) -> String {
        format!("{}{}", NODE_TOPIC_PREFIX, node_id)
    }
}

/// MQTT-style filter matching.
///
/// `+` matches exactly one level, `#` matches the remainder of the topic
/// (including nothing) and is only honoured as the final level.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');
    
    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return filter_levels.next().is_none(),
            (Some("+"), Some(_)) => continue,
            (Some(f), Some(t)) if f == t => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// Checks that a subscription filter is well-formed.
pub fn validate_filter(filter: &str) -> Result<(), EnvError> {
    if filter.is_empty() {
        return Err(EnvError::invalid_topic("<empty>"));
    }
    
    let levels: Vec<&str> = filter.split('/').collect();
    for (i, level) in levels.iter().enumerate() {
        let wildcard_misuse = (level.contains('#') && (*level != "#" || i != levels.len() - 1))
            || (level.contains('+') && *level != "+");
        if wildcard_misuse {
            return Err(EnvError::invalid_topic(filter));
        }
    }
    
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_classify_node_topic() {
        assert_eq!(
            Topic::classify("airsea/base/nodes/!a1b2c3"),
            Some(Topic::Node("!a1b2c3".to_string()))
        );
        assert_eq!(Topic::classify(SUMMARY_TOPIC), Some(Topic::Summary));
    }
    
    #[test]
    fn test_classify_rejects_other_topics() {
        assert_eq!(Topic::classify("airsea/base/nodes/"), None);
        assert_eq!(Topic::classify("airsea/base/nodes/a/b"), None);
        assert_eq!(Topic::classify("airsea/base/other"), None);
        assert_eq!(Topic::classify("airsea/base/summary/x"), None);
    }
    
    #[test]
    fn test_node_topic_round_trip() {
        let topic = Topic::node("!deadbeef");
        assert_eq!(topic, "airsea/base/nodes/!deadbeef");
        assert_eq!(Topic::classify(&topic), Some(Topic::Node("!deadbeef".into())));
    }
    
    #[test]
    fn test_single_level_wildcard() {
        assert!(topic_matches(NODE_TOPIC_FILTER, "airsea/base/nodes/!a1b2c3"));
        assert!(!topic_matches(NODE_TOPIC_FILTER, "airsea/base/nodes/a/b"));
        assert!(!topic_matches(NODE_TOPIC_FILTER, "airsea/base/nodes"));
        assert!(!topic_matches(NODE_TOPIC_FILTER, SUMMARY_TOPIC));
    }
    
    #[test]
    fn test_multi_level_wildcard() {
        assert!(topic_matches("airsea/#", "airsea/base/nodes/x"));
        assert!(topic_matches("airsea/base/#", "airsea/base"));
        assert!(topic_matches("#", SUMMARY_TOPIC));
        assert!(!topic_matches("airsea/#/x", "airsea/base/x"));
    }
    
    #[test]
    fn test_exact_match() {
        assert!(topic_matches(SUMMARY_TOPIC, SUMMARY_TOPIC));
        assert!(!topic_matches(SUMMARY_TOPIC, "airsea/base/summary/extra"));
    }
    
    #[test]
    fn test_validate_filter() {
        assert!(validate_filter(NODE_TOPIC_FILTER).is_ok());
        assert!(validate_filter("airsea/#").is_ok());
        assert!(validate_filter("").is_err());
        assert!(validate_filter("airsea/#/nodes").is_err());
        assert!(validate_filter("airsea/no+des").is_err());
        assert!(validate_filter("airsea/base#").is_err());
    }
}
