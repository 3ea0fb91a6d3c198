use aws_sdk_sns::error::DisplayErrorContext;
use provision_notify_core::{
    ClientCredentials, PublishError, PublishReceipt, PublishRequest, Publisher, PublisherFactory,
};
use tracing::{debug, error, info, instrument};

use crate::auth::build_sdk_config;
use crate::error::classify_sdk_error;

/// Publishes run notifications to an SNS topic.
pub struct SnsPublisher {
    client: aws_sdk_sns::Client,
}

impl std::fmt::Debug for SnsPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnsPublisher")
            .field("region", &self.client.config().region())
            .field("client", &"<SnsClient>")
            .finish()
    }
}

impl SnsPublisher {
    /// Create an `SnsPublisher` by building an AWS SDK client.
    ///
    /// Fails with [`PublishError::Configuration`] when no region could be
    /// resolved from the credentials or the SDK's own region chain.
    pub async fn connect(credentials: &ClientCredentials) -> Result<Self, PublishError> {
        let sdk_config = build_sdk_config(credentials).await;
        require_region(&sdk_config)?;
        Ok(Self {
            client: aws_sdk_sns::Client::new(&sdk_config),
        })
    }

    /// Create an `SnsPublisher` with a pre-built client (for testing).
    pub fn with_client(client: aws_sdk_sns::Client) -> Self {
        Self { client }
    }
}

impl Publisher for SnsPublisher {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "aws-sns"
    }

    #[instrument(skip_all, fields(topic_arn = %request.topic_arn, publisher = "aws-sns"))]
    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, PublishError> {
        debug!(
            subject_len = request.subject.len(),
            body_bytes = request.message.len(),
            "publishing to SNS topic"
        );

        let mut call = self
            .client
            .publish()
            .topic_arn(&request.topic_arn)
            .message(&request.message)
            .subject(&request.subject);

        if let Some(ref structure) = request.message_structure {
            call = call.message_structure(structure);
        }

        let result = call.send().await.map_err(|e| {
            let err_str = DisplayErrorContext(&e).to_string();
            error!(error = %err_str, "SNS publish failed");
            PublishError::from(classify_sdk_error(&err_str))
        })?;

        let message_id = result.message_id().unwrap_or("unknown").to_owned();
        info!(message_id = %message_id, "SNS message published");

        Ok(PublishReceipt { message_id })
    }
}

/// Builds [`SnsPublisher`]s from resolved credentials.
#[derive(Debug, Default)]
pub struct SnsPublisherFactory;

impl PublisherFactory for SnsPublisherFactory {
    type Publisher = SnsPublisher;

    async fn connect(&self, credentials: &ClientCredentials) -> Result<SnsPublisher, PublishError> {
        debug!(region = ?credentials.region, "building SNS client");
        SnsPublisher::connect(credentials).await
    }
}

/// SNS requests cannot be signed without a region.
fn require_region(sdk_config: &aws_config::SdkConfig) -> Result<(), PublishError> {
    if sdk_config.region().is_some() {
        Ok(())
    } else {
        Err(PublishError::Configuration(
            "no region configured, derived from the topic, or found in instance metadata".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use aws_config::{Region, SdkConfig};

    use super::*;

    #[test]
    fn missing_region_is_a_configuration_error() {
        let err = require_region(&SdkConfig::builder().build()).unwrap_err();
        assert!(matches!(err, PublishError::Configuration(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn resolved_region_is_accepted() {
        let sdk_config = SdkConfig::builder()
            .region(Region::new("eu-west-1"))
            .build();
        require_region(&sdk_config).unwrap();
    }
}

#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use aws_sdk_sns::config::{BehaviorVersion, Credentials, Region};

    use super::*;

    // Client construction needs a TLS root certificate store, and the
    // publish test needs an SNS-compatible endpoint (e.g. LocalStack) with
    // the topic below already created.

    fn offline_client(region: &str) -> aws_sdk_sns::Client {
        let config = aws_sdk_sns::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_owned()))
            .credentials_provider(Credentials::new("key", "secret", None, None, "test"))
            .build();
        aws_sdk_sns::Client::from_conf(config)
    }

    #[tokio::test]
    async fn debug_shows_region_only() {
        let publisher = SnsPublisher::with_client(offline_client("eu-west-1"));
        assert_eq!(publisher.name(), "aws-sns");
        let debug = format!("{publisher:?}");
        assert!(debug.contains("eu-west-1"));
        assert!(!debug.contains("secret"));
    }

    #[tokio::test]
    async fn publish_to_local_endpoint() {
        let credentials = ClientCredentials {
            access_key: "test".into(),
            secret_key: "test".into(),
            token: None,
            region: Some("us-east-1".into()),
            endpoint_url: Some("http://localhost:4566".into()),
        };
        let publisher = SnsPublisherFactory.connect(&credentials).await.unwrap();
        let receipt = publisher
            .publish(&PublishRequest {
                topic_arn: "arn:aws:sns:us-east-1:000000000000:provision-notify".into(),
                message: "integration test".into(),
                subject: "provision-notify".into(),
                message_structure: None,
            })
            .await
            .unwrap();
        assert!(!receipt.message_id.is_empty());
    }
}
