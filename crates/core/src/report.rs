use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Everything the host knows about a finished run.
///
/// This is the only input the reporter reads besides its own configuration.
/// Hosts usually produce it as JSON at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// The node that was provisioned.
    pub node: NodeInfo,
    /// Outcome and timing of the run.
    pub run: RunStatus,
    /// Whether the client ran in solo (server-less) mode.
    #[serde(default)]
    pub solo: bool,
}

/// Descriptive data about the provisioned node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Node name as registered with the configuration server.
    pub name: String,
    /// Fully qualified network hostname, if known.
    #[serde(default)]
    pub fqdn: Option<String>,
    /// Expanded run list entries, e.g. `recipe[nginx]` or `role[web]`.
    #[serde(default)]
    pub run_list: Vec<String>,
    /// Environment the node belongs to.
    #[serde(default = "default_environment")]
    pub chef_environment: String,
    /// Raw node attribute tree (instance metadata, opsworks data, ...).
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

fn default_environment() -> String {
    "_default".to_owned()
}

impl NodeInfo {
    /// Create a node with just a name and otherwise empty data.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fqdn: None,
            run_list: Vec::new(),
            chef_environment: default_environment(),
            attributes: Map::new(),
        }
    }

    /// Look up a nested attribute, e.g. `["opsworks", "activity"]`.
    ///
    /// Returns `None` as soon as one segment is missing or an intermediate
    /// value is not an object.
    pub fn attribute(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.attributes.get(*first)?;
        for segment in rest {
            current = current.as_object()?.get(*segment)?;
        }
        Some(current)
    }

    /// Run list rendered the way the client prints it: entries joined by `", "`.
    pub fn run_list_description(&self) -> String {
        self.run_list.join(", ")
    }
}

/// Outcome of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatus {
    /// `true` if the run converged without an exception.
    pub success: bool,
    /// When the run started.
    pub start_time: DateTime<Utc>,
    /// When the run finished.
    pub end_time: DateTime<Utc>,
    /// Formatted exception, present on failed runs.
    #[serde(default)]
    pub exception: Option<String>,
    /// Backtrace lines of the exception.
    #[serde(default)]
    pub backtrace: Vec<String>,
}

impl RunStatus {
    /// `"success"` or `"failure"`.
    pub fn status(&self) -> &'static str {
        if self.success { "success" } else { "failure" }
    }

    /// Elapsed run time in seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn elapsed_time(&self) -> f64 {
        (self.end_time - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_minimal_report() {
        let json = serde_json::json!({
            "node": {"name": "web-1"},
            "run": {
                "success": true,
                "start_time": "2026-01-01T10:00:00Z",
                "end_time": "2026-01-01T10:01:30Z"
            }
        });
        let report: RunReport = serde_json::from_value(json).unwrap();
        assert_eq!(report.node.name, "web-1");
        assert_eq!(report.node.chef_environment, "_default");
        assert!(report.node.fqdn.is_none());
        assert!(report.node.attributes.is_empty());
        assert!(!report.solo);
        assert!(report.run.exception.is_none());
        assert!(report.run.backtrace.is_empty());
    }

    #[test]
    fn elapsed_time_in_seconds() {
        let json = serde_json::json!({
            "success": false,
            "start_time": "2026-01-01T10:00:00Z",
            "end_time": "2026-01-01T10:01:30.500Z"
        });
        let run: RunStatus = serde_json::from_value(json).unwrap();
        assert!((run.elapsed_time() - 90.5).abs() < f64::EPSILON);
        assert_eq!(run.status(), "failure");
    }

    #[test]
    fn nested_attribute_lookup() {
        let mut node = NodeInfo::new("db-1");
        node.attributes.insert(
            "opsworks".into(),
            serde_json::json!({"activity": "deploy", "stack": {"name": "prod"}}),
        );

        assert_eq!(
            node.attribute(&["opsworks", "activity"]),
            Some(&Value::from("deploy"))
        );
        assert_eq!(
            node.attribute(&["opsworks", "stack", "name"]),
            Some(&Value::from("prod"))
        );
        assert!(node.attribute(&["opsworks", "activity", "deeper"]).is_none());
        assert!(node.attribute(&["ec2"]).is_none());
        assert!(node.attribute(&[]).is_none());
    }

    #[test]
    fn run_list_is_comma_joined() {
        let mut node = NodeInfo::new("app");
        node.run_list = vec!["role[base]".into(), "recipe[nginx::default]".into()];
        assert_eq!(node.run_list_description(), "role[base], recipe[nginx::default]");
    }
}
