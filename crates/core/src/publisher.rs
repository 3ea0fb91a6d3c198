use std::future::Future;

use crate::error::PublishError;

/// Settings needed to construct a transport client.
///
/// Produced by [`HandlerConfig::client_credentials`](crate::HandlerConfig::client_credentials)
/// once configuration and instance metadata have been merged.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub access_key: String,
    pub secret_key: String,
    /// Session token, for temporary credentials.
    pub token: Option<String>,
    /// Target region. `None` leaves the choice to the client's defaults.
    pub region: Option<String>,
    /// Endpoint override, e.g. a local emulator.
    pub endpoint_url: Option<String>,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("access_key", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

/// A single message to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    /// Topic identifier, e.g. `arn:aws:sns:eu-west-1:123456789012:alerts`.
    pub topic_arn: String,
    /// Message body.
    pub message: String,
    /// Message subject.
    pub subject: String,
    /// Optional message structure (`"json"` for per-protocol bodies).
    pub message_structure: Option<String>,
}

/// Acknowledgement returned by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Identifier assigned to the message by the service.
    pub message_id: String,
}

/// Outbound transport capability.
///
/// Implementations perform exactly one delivery attempt per call and return
/// any failure as-is.
pub trait Publisher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Publish `request` to its topic.
    fn publish(
        &self,
        request: &PublishRequest,
    ) -> impl Future<Output = Result<PublishReceipt, PublishError>> + Send;
}

/// Builds a [`Publisher`] from resolved credentials.
///
/// The reporter calls [`connect`](Self::connect) at most once and keeps the
/// resulting client for its whole lifetime.
pub trait PublisherFactory: Send + Sync {
    type Publisher: Publisher;

    fn connect(
        &self,
        credentials: &ClientCredentials,
    ) -> impl Future<Output = Result<Self::Publisher, PublishError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_is_redacted() {
        let credentials = ClientCredentials {
            access_key: "AKIAEXAMPLE".into(),
            secret_key: "wJalrXUtnFEMI".into(),
            token: Some("session".into()),
            region: Some("eu-west-1".into()),
            endpoint_url: None,
        };
        let debug = format!("{credentials:?}");
        assert!(debug.contains("eu-west-1"));
        assert!(!debug.contains("AKIAEXAMPLE"));
        assert!(!debug.contains("wJalrXUtnFEMI"));
        assert!(!debug.contains("session"));
    }
}
