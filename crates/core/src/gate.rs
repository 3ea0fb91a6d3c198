//! Activity-based publish filter.

use serde_json::Value;
use tracing::{debug, warn};

use crate::report::NodeInfo;

/// Attribute path holding the current lifecycle activity.
const ACTIVITY_PATH: [&str; 2] = ["opsworks", "activity"];

/// Decide whether a notification should be sent for this node.
///
/// Without a filter every run is published. With a filter, the node's
/// `opsworks.activity` attribute must be one of the listed activities; a
/// missing attribute denies publishing.
pub fn should_publish(filter: Option<&[String]>, node: &NodeInfo) -> bool {
    let Some(allowed) = filter else {
        return true;
    };

    match node.attribute(&ACTIVITY_PATH) {
        Some(Value::String(activity)) => {
            let matched = allowed.iter().any(|a| a == activity);
            debug!(activity = %activity, matched, "activity filter evaluated");
            matched
        }
        Some(other) => {
            debug!(activity = %other, "activity attribute is not a string");
            false
        }
        None => {
            warn!(
                node = %node.name,
                "activity filter configured but opsworks.activity attribute is missing"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_support::count_warnings;

    fn node_with_activity(activity: Option<Value>) -> NodeInfo {
        let mut node = NodeInfo::new("test");
        if let Some(activity) = activity {
            node.attributes
                .insert("opsworks".into(), json!({"activity": activity}));
        }
        node
    }

    fn filter() -> Vec<String> {
        vec!["deploy".into(), "setup".into()]
    }

    #[test]
    fn no_filter_always_publishes() {
        assert!(should_publish(None, &node_with_activity(None)));
        assert!(should_publish(None, &node_with_activity(Some(json!("configure")))));
    }

    #[test]
    fn matching_activity_publishes() {
        let node = node_with_activity(Some(json!("deploy")));
        assert!(should_publish(Some(&filter()), &node));
    }

    #[test]
    fn other_activity_is_denied() {
        let node = node_with_activity(Some(json!("configure")));
        assert!(!should_publish(Some(&filter()), &node));
    }

    #[test]
    fn missing_attribute_is_denied() {
        assert!(!should_publish(Some(&filter()), &node_with_activity(None)));
    }

    #[test]
    fn missing_attribute_warns_once() {
        let (publish, warnings) =
            count_warnings(|| should_publish(Some(&filter()), &node_with_activity(None)));
        assert!(!publish);
        assert_eq!(warnings, 1);

        let node = node_with_activity(Some(json!("configure")));
        let (_, warnings) = count_warnings(|| should_publish(Some(&filter()), &node));
        assert_eq!(warnings, 0);
    }

    #[test]
    fn namespace_without_activity_is_denied() {
        let mut node = NodeInfo::new("test");
        node.attributes.insert("opsworks".into(), json!({"stack": "prod"}));
        assert!(!should_publish(Some(&filter()), &node));
    }

    #[test]
    fn non_string_activity_is_denied() {
        let node = node_with_activity(Some(json!(["deploy"])));
        assert!(!should_publish(Some(&filter()), &node));
    }

    #[test]
    fn empty_filter_denies_everything() {
        let node = node_with_activity(Some(json!("deploy")));
        assert!(!should_publish(Some(&[]), &node));
    }
}
