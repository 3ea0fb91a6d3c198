//! Credentials and region discovered from cloud instance metadata.

use serde_json::{Map, Value};
use tracing::debug;

use crate::report::NodeInfo;

/// Values found in the node's `ec2` attribute tree.
///
/// These are candidates only: the configuration applies them to fields that
/// are still unset, so explicit settings always win.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct InstanceMetadata {
    /// Region derived from the placement availability zone.
    pub region: Option<String>,
    /// `AccessKeyId` of the first instance-profile role.
    pub access_key: Option<String>,
    /// `SecretAccessKey` of the first instance-profile role.
    pub secret_key: Option<String>,
    /// Session `Token` of the first instance-profile role.
    pub token: Option<String>,
}

impl std::fmt::Debug for InstanceMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceMetadata")
            .field("region", &self.region)
            .field("access_key", &self.access_key.as_ref().map(|_| "[REDACTED]"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl InstanceMetadata {
    /// Read the metadata attached to a node.
    pub fn from_node(node: &NodeInfo) -> Self {
        Self::from_attributes(&node.attributes)
    }

    /// Read the metadata from a raw attribute tree.
    ///
    /// Only the first role listed under `ec2.iam.security-credentials` is
    /// consulted.
    pub fn from_attributes(attributes: &Map<String, Value>) -> Self {
        let mut found = Self::default();
        let Some(ec2) = attributes.get("ec2").and_then(Value::as_object) else {
            return found;
        };

        if let Some(zone) = ec2
            .get("placement_availability_zone")
            .and_then(Value::as_str)
        {
            found.region = region_from_zone(zone);
        }

        let first_role = ec2
            .get("iam")
            .and_then(Value::as_object)
            .and_then(|iam| iam.get("security-credentials"))
            .and_then(Value::as_object)
            .and_then(|roles| roles.iter().next());

        if let Some((role, credentials)) = first_role {
            debug!(role = %role, "found instance profile credentials");
            let key = |name: &str| credentials.get(name).and_then(Value::as_str).map(str::to_owned);
            found.access_key = key("AccessKeyId");
            found.secret_key = key("SecretAccessKey");
            found.token = key("Token");
        }

        found
    }
}

/// `"us-east-1a"` becomes `"us-east-1"`.
fn region_from_zone(zone: &str) -> Option<String> {
    let mut chars = zone.chars();
    chars.next_back()?;
    Some(chars.as_str().to_owned())
}
