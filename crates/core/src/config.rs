//! Handler configuration: a fixed field table with typed, validated values.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ReportError;
use crate::metadata::InstanceMetadata;
use crate::publisher::ClientCredentials;
use crate::report::RunReport;

/// Keys with this prefix name internal operations and are never settable.
pub const RESERVED_PREFIX: &str = "config_";

/// Fields that must be set before a message can be published.
pub const REQUIRED: [Field; 3] = [Field::AccessKey, Field::SecretKey, Field::TopicArn];

/// Value type accepted by a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A string.
    String,
    /// A string, or `false` to explicitly disable the setting.
    StringOrFalse,
    /// A list of strings. A bare string is accepted as a one-element list.
    StringList,
}

/// Every configurable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    AccessKey,
    SecretKey,
    Region,
    Token,
    TopicArn,
    SubjectTemplate,
    BodyTemplatePath,
    ActivityFilter,
    MessageStructure,
    EndpointUrl,
}

/// Schema entry for a [`Field`].
#[derive(Debug)]
pub struct FieldSpec {
    pub field: Field,
    /// Canonical key in the inbound mapping.
    pub name: &'static str,
    /// Older key names accepted for the same field.
    pub aliases: &'static [&'static str],
    pub kind: FieldKind,
    /// Whether values are secret and must not be logged.
    pub secret: bool,
}

/// The field table, in [`Field`] declaration order. Lookup by key goes
/// through this list only.
pub const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        field: Field::AccessKey,
        name: "access_key",
        aliases: &[],
        kind: FieldKind::String,
        secret: true,
    },
    FieldSpec {
        field: Field::SecretKey,
        name: "secret_key",
        aliases: &[],
        kind: FieldKind::String,
        secret: true,
    },
    FieldSpec {
        field: Field::Region,
        name: "region",
        aliases: &[],
        kind: FieldKind::String,
        secret: false,
    },
    FieldSpec {
        field: Field::Token,
        name: "token",
        aliases: &[],
        kind: FieldKind::StringOrFalse,
        secret: true,
    },
    FieldSpec {
        field: Field::TopicArn,
        name: "topic_identifier",
        aliases: &["topic_arn"],
        kind: FieldKind::String,
        secret: false,
    },
    FieldSpec {
        field: Field::SubjectTemplate,
        name: "subject_template",
        aliases: &["subject"],
        kind: FieldKind::String,
        secret: false,
    },
    FieldSpec {
        field: Field::BodyTemplatePath,
        name: "body_template_path",
        aliases: &["body_template"],
        kind: FieldKind::String,
        secret: false,
    },
    FieldSpec {
        field: Field::ActivityFilter,
        name: "activity_filter",
        aliases: &["filter_opsworks_activity"],
        kind: FieldKind::StringList,
        secret: false,
    },
    FieldSpec {
        field: Field::MessageStructure,
        name: "message_structure",
        aliases: &[],
        kind: FieldKind::String,
        secret: false,
    },
    FieldSpec {
        field: Field::EndpointUrl,
        name: "endpoint_url",
        aliases: &[],
        kind: FieldKind::String,
        secret: false,
    },
];

impl Field {
    /// Schema entry for this field.
    pub fn spec(self) -> &'static FieldSpec {
        &FIELDS[self as usize]
    }

    /// Canonical key name.
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Find a field by canonical name or alias.
    pub fn lookup(key: &str) -> Option<Self> {
        FIELDS
            .iter()
            .find(|spec| spec.name == key || spec.aliases.contains(&key))
            .map(|spec| spec.field)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Str(String),
    /// Explicitly disabled (`false`), distinct from never set.
    Disabled,
    List(Vec<String>),
}

impl ConfigValue {
    /// Check `value` against `kind` and convert it.
    fn coerce(field: Field, kind: FieldKind, value: Value) -> Result<Self, ReportError> {
        match (kind, value) {
            (_, Value::String(s)) if kind != FieldKind::StringList => Ok(Self::Str(s)),
            (FieldKind::StringOrFalse, Value::Bool(false)) => Ok(Self::Disabled),
            (FieldKind::StringList, Value::String(s)) => Ok(Self::List(vec![s])),
            (FieldKind::StringList, Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(type_mismatch(field, kind, &other)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            (_, other) => Err(type_mismatch(field, kind, &other)),
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Disabled | Self::List(_) => None,
        }
    }
}

fn type_mismatch(field: Field, kind: FieldKind, value: &Value) -> ReportError {
    let expected = match kind {
        FieldKind::String => "a string",
        FieldKind::StringOrFalse => "a string or false",
        FieldKind::StringList => "a string or an array of strings",
    };
    let got = match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    ReportError::ValidationFailed(format!(
        "Option {field} must be {expected}, got {got}!"
    ))
}

/// Configuration of the notifier.
///
/// Built once from an inbound mapping ([`HandlerConfig::from_map`]) or field
/// by field ([`HandlerConfig::set`]), and checked with
/// [`HandlerConfig::check`] right before every publish.
#[derive(Clone, Default)]
pub struct HandlerConfig {
    values: HashMap<Field, ConfigValue>,
}

impl std::fmt::Debug for HandlerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = f.debug_struct("HandlerConfig");
        for spec in FIELDS {
            if let Some(value) = self.values.get(&spec.field) {
                if spec.secret {
                    out.field(spec.name, &"[REDACTED]");
                } else {
                    out.field(spec.name, value);
                }
            }
        }
        out.finish()
    }
}

impl HandlerConfig {
    /// An empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from an inbound key/value mapping.
    ///
    /// Unknown keys and keys starting with [`RESERVED_PREFIX`] are skipped
    /// with a warning. Values of the wrong type fail the whole mapping.
    pub fn from_map(map: Map<String, Value>) -> Result<Self, ReportError> {
        let mut config = Self::new();
        for (key, value) in map {
            if key.starts_with(RESERVED_PREFIX) {
                warn!(key = %key, "reserved configuration key is not settable, ignoring");
                continue;
            }
            let Some(field) = Field::lookup(&key) else {
                warn!(key = %key, "unknown configuration key, ignoring");
                continue;
            };
            config.set(field, value)?;
        }
        Ok(config)
    }

    /// Set a field, validating the value type.
    ///
    /// Setting [`Field::TopicArn`] also derives [`Field::Region`] from the
    /// topic's fourth segment, unless a region is already set.
    pub fn set(&mut self, field: Field, value: impl Into<Value>) -> Result<(), ReportError> {
        let spec = field.spec();
        let value = ConfigValue::coerce(field, spec.kind, value.into())?;

        if field == Field::TopicArn
            && !self.values.contains_key(&Field::Region)
            && let Some(region) = value.as_str().and_then(region_from_topic)
        {
            debug!(region = %region, "region derived from topic identifier");
            self.values
                .insert(Field::Region, ConfigValue::Str(region.to_owned()));
        }

        self.values.insert(field, value);
        Ok(())
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, field: Field, value: impl Into<Value>) -> Result<Self, ReportError> {
        self.set(field, value)?;
        Ok(self)
    }

    /// Current value of a field, `None` if it was never set.
    pub fn get(&self, field: Field) -> Option<&ConfigValue> {
        self.values.get(&field)
    }

    fn get_str(&self, field: Field) -> Option<&str> {
        self.get(field).and_then(ConfigValue::as_str)
    }

    pub fn access_key(&self) -> Option<&str> {
        self.get_str(Field::AccessKey)
    }

    pub fn secret_key(&self) -> Option<&str> {
        self.get_str(Field::SecretKey)
    }

    pub fn region(&self) -> Option<&str> {
        self.get_str(Field::Region)
    }

    /// Session token; `None` both when unset and when disabled with `false`.
    pub fn token(&self) -> Option<&str> {
        self.get_str(Field::Token)
    }

    pub fn topic_arn(&self) -> Option<&str> {
        self.get_str(Field::TopicArn)
    }

    pub fn subject_template(&self) -> Option<&str> {
        self.get_str(Field::SubjectTemplate)
    }

    pub fn body_template_path(&self) -> Option<&Path> {
        self.get_str(Field::BodyTemplatePath).map(Path::new)
    }

    pub fn activity_filter(&self) -> Option<&[String]> {
        match self.get(Field::ActivityFilter)? {
            ConfigValue::List(items) => Some(items),
            ConfigValue::Str(_) | ConfigValue::Disabled => None,
        }
    }

    pub fn message_structure(&self) -> Option<&str> {
        self.get_str(Field::MessageStructure)
    }

    pub fn endpoint_url(&self) -> Option<&str> {
        self.get_str(Field::EndpointUrl)
    }

    /// Fill unset credentials from instance metadata.
    ///
    /// Only `access_key`, `secret_key` and `token` are backfilled; a token
    /// disabled with `false` stays disabled.
    pub fn backfill(&mut self, metadata: &InstanceMetadata) {
        let candidates = [
            (Field::AccessKey, &metadata.access_key),
            (Field::SecretKey, &metadata.secret_key),
            (Field::Token, &metadata.token),
        ];
        for (field, candidate) in candidates {
            if let Some(candidate) = candidate
                && !self.values.contains_key(&field)
            {
                debug!(field = %field, "using value from instance metadata");
                self.values.insert(field, ConfigValue::Str(candidate.clone()));
            }
        }
    }

    /// Validate the configuration before publishing.
    ///
    /// With a report, credentials are first backfilled from the node's
    /// instance metadata. Fails on the first missing required field, then on
    /// a body template path that does not exist.
    pub fn check(&mut self, report: Option<&RunReport>) -> Result<(), ReportError> {
        if let Some(report) = report {
            self.backfill(&InstanceMetadata::from_node(&report.node));
        }

        for field in REQUIRED {
            if self.get_str(field).is_none() {
                return Err(ReportError::ValidationFailed(format!(
                    "Required argument {field} is missing!"
                )));
            }
        }

        if let Some(path) = self.body_template_path()
            && !path.exists()
        {
            return Err(ReportError::ValidationFailed(format!(
                "Template file not found: {}.",
                path.display()
            )));
        }

        Ok(())
    }

    /// Credentials and endpoint settings for building the transport client.
    ///
    /// The region comes from the configuration (explicit or derived from the
    /// topic identifier) and only falls back to the instance metadata zone.
    pub fn client_credentials(
        &self,
        metadata: &InstanceMetadata,
    ) -> Result<ClientCredentials, ReportError> {
        let missing = |field: Field| {
            ReportError::ValidationFailed(format!("Required argument {field} is missing!"))
        };
        Ok(ClientCredentials {
            access_key: self
                .access_key()
                .ok_or_else(|| missing(Field::AccessKey))?
                .to_owned(),
            secret_key: self
                .secret_key()
                .ok_or_else(|| missing(Field::SecretKey))?
                .to_owned(),
            token: self.token().map(str::to_owned),
            region: self
                .region()
                .map(str::to_owned)
                .or_else(|| metadata.region.clone()),
            endpoint_url: self.endpoint_url().map(str::to_owned),
        })
    }
}

/// Region segment of `scheme:service:region:account:name`.
///
/// Identifiers with fewer than five segments carry no region.
fn region_from_topic(topic: &str) -> Option<&str> {
    let segments: Vec<&str> = topic.splitn(5, ':').collect();
    match segments.as_slice() {
        [_, _, _, region, _] if !region.is_empty() => Some(*region),
        _ => None,
    }
}
