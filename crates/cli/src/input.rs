use std::io::Read;
use std::path::Path;

use anyhow::Context;
use provision_notify_core::{HandlerConfig, RunReport};

/// Load the handler configuration from a TOML file.
///
/// The top-level table is the inbound key/value mapping, e.g.
///
/// ```toml
/// topic_identifier = "arn:aws:sns:eu-west-1:123456789012:runs"
/// access_key = "AKIA..."
/// secret_key = "..."
/// activity_filter = ["deploy", "setup"]
/// ```
pub fn load_config(path: &Path) -> anyhow::Result<HandlerConfig> {
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

fn parse_config(contents: &str) -> anyhow::Result<HandlerConfig> {
    let table: toml::Table = toml::from_str(contents)?;
    let serde_json::Value::Object(map) = serde_json::to_value(table)? else {
        anyhow::bail!("configuration must be a table");
    };
    Ok(HandlerConfig::from_map(map)?)
}

/// Load the run report from a JSON file, or from stdin when `source` is `-`.
pub fn load_report(source: &str) -> anyhow::Result<RunReport> {
    let contents = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading run report from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading {source}"))?
    };
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use provision_notify_core::ConfigValue;
    use provision_notify_core::Field;

    use super::*;

    #[test]
    fn parse_full_config() {
        let config = parse_config(
            r#"
            access_key = "***AMAZON-KEY***"
            secret_key = "***AMAZON-SECRET***"
            token = false
            topic_identifier = "arn:aws:sns:eu-west-1:1234:MyTopic"
            subject_template = "<%= node.name %> finished"
            activity_filter = ["deploy", "setup"]
            "#,
        )
        .unwrap();

        assert_eq!(config.access_key(), Some("***AMAZON-KEY***"));
        assert_eq!(config.get(Field::Token), Some(&ConfigValue::Disabled));
        assert_eq!(config.region(), Some("eu-west-1"));
        assert_eq!(config.subject_template(), Some("<%= node.name %> finished"));
        assert_eq!(config.activity_filter().map(<[String]>::len), Some(2));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config = parse_config(
            r#"
            topic_arn = "arn:aws:sns:us-east-1:1:t"
            colour = "blue"
            "#,
        )
        .unwrap();
        assert_eq!(config.topic_arn(), Some("arn:aws:sns:us-east-1:1:t"));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let err = parse_config("access_key = 42").unwrap_err();
        assert!(err.to_string().contains("access_key"));
    }

    #[test]
    fn invalid_toml_is_rejected() {
        assert!(parse_config("access_key = ").is_err());
    }

    #[test]
    fn load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "region = \"us-west-2\"").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.region(), Some("us-west-2"));
    }

    #[test]
    fn load_report_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "node": {{"name": "web-1", "attributes": {{"opsworks": {{"activity": "deploy"}}}}}},
                "run": {{
                    "success": false,
                    "start_time": "2026-01-01T10:00:00Z",
                    "end_time": "2026-01-01T10:00:42Z",
                    "exception": "boom",
                    "backtrace": ["a.rb:1"]
                }},
                "solo": true
            }}"#
        )
        .unwrap();

        let report = load_report(file.path().to_str().unwrap()).unwrap();
        assert_eq!(report.node.name, "web-1");
        assert!(report.solo);
        assert_eq!(report.run.exception.as_deref(), Some("boom"));
        assert_eq!(
            report.node.attribute(&["opsworks", "activity"]),
            Some(&serde_json::Value::from("deploy"))
        );
    }

    #[test]
    fn missing_report_file_fails() {
        let err = load_report("/nonexistent/report.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/report.json"));
    }
}
