use tracing::info;

use crate::error::PublishError;
use crate::publisher::{ClientCredentials, PublishReceipt, PublishRequest, Publisher, PublisherFactory};

/// A publisher that logs the message instead of sending it.
///
/// Useful for dry runs and for checking templates without network access.
#[derive(Debug)]
pub struct LogPublisher {
    name: String,
}

impl LogPublisher {
    /// Create a new `LogPublisher` with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Publisher for LogPublisher {
    fn name(&self) -> &str {
        &self.name
    }

    #[allow(clippy::unused_async)]
    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, PublishError> {
        info!(
            publisher = %self.name,
            topic_arn = %request.topic_arn,
            subject = %request.subject,
            body_bytes = request.message.len(),
            "log publisher received message"
        );
        Ok(PublishReceipt {
            message_id: format!("{}-dry-run", self.name),
        })
    }
}

/// Factory handing out [`LogPublisher`]s; ignores the credentials.
#[derive(Debug, Default)]
pub struct LogPublisherFactory;

impl PublisherFactory for LogPublisherFactory {
    type Publisher = LogPublisher;

    #[allow(clippy::unused_async)]
    async fn connect(&self, credentials: &ClientCredentials) -> Result<LogPublisher, PublishError> {
        info!(region = ?credentials.region, "dry run, messages will only be logged");
        Ok(LogPublisher::new("log"))
    }
}
