use tracing::{debug, info, instrument};

use crate::config::HandlerConfig;
use crate::error::ReportError;
use crate::format;
use crate::gate;
use crate::metadata::InstanceMetadata;
use crate::outcome::ReportOutcome;
use crate::publisher::{PublishRequest, Publisher, PublisherFactory};
use crate::report::RunReport;

/// End-of-run notifier.
///
/// Owns the configuration and, after the first publish, the transport
/// client. The client is built from the credentials resolved on first use
/// and reused for every later report.
///
/// `report` takes `&mut self`: the notifier is driven by one run at a time.
pub struct Reporter<F: PublisherFactory> {
    config: HandlerConfig,
    factory: F,
    publisher: Option<F::Publisher>,
}

impl<F: PublisherFactory> std::fmt::Debug for Reporter<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("config", &self.config)
            .field("connected", &self.publisher.is_some())
            .finish_non_exhaustive()
    }
}

impl<F: PublisherFactory> Reporter<F> {
    /// Create a reporter; no client is built until the first publish.
    pub fn new(config: HandlerConfig, factory: F) -> Self {
        Self {
            config,
            factory,
            publisher: None,
        }
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Whether the transport client has been built.
    pub fn is_connected(&self) -> bool {
        self.publisher.is_some()
    }

    /// Validate, gate, render, and publish the notification for `report`.
    ///
    /// Validation, template, and transport errors are returned unchanged.
    #[instrument(skip_all, fields(node = %report.node.name, success = report.run.success))]
    pub async fn report(&mut self, report: &RunReport) -> Result<ReportOutcome, ReportError> {
        self.config.check(Some(report))?;

        if !gate::should_publish(self.config.activity_filter(), &report.node) {
            info!("notification suppressed by activity filter");
            return Ok(ReportOutcome::Skipped);
        }

        let message = format::render_message(&self.config, report)?;
        let topic_arn = self.config.topic_arn().ok_or_else(|| {
            ReportError::ValidationFailed("Required argument topic_identifier is missing!".into())
        })?;
        let request = PublishRequest {
            topic_arn: topic_arn.to_owned(),
            message: message.body,
            subject: message.subject,
            message_structure: self.config.message_structure().map(str::to_owned),
        };

        let publisher = match self.publisher.take() {
            Some(publisher) => publisher,
            None => self.connect(report).await?,
        };
        let publisher = self.publisher.insert(publisher);

        debug!(
            publisher = publisher.name(),
            topic_arn = %request.topic_arn,
            subject = %request.subject,
            "publishing run notification"
        );
        let receipt = publisher.publish(&request).await?;
        info!(message_id = %receipt.message_id, "run notification published");

        Ok(ReportOutcome::Published {
            message_id: receipt.message_id,
        })
    }

    async fn connect(&self, report: &RunReport) -> Result<F::Publisher, ReportError> {
        let metadata = InstanceMetadata::from_node(&report.node);
        let credentials = self.config.client_credentials(&metadata)?;
        debug!(region = ?credentials.region, "building transport client");
        Ok(self.factory.connect(&credentials).await?)
    }
}
