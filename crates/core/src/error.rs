use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by a report invocation.
///
/// None of these are recovered internally: validation, rendering, and
/// transport failures all propagate to the host unchanged.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A required field is missing, a value has the wrong type, or the
    /// configured body template does not exist.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// A subject or body template could not be compiled or evaluated.
    #[error("template error: {0}")]
    TemplateRender(String),

    /// The body template file exists but could not be read.
    #[error("failed to read template {}: {source}", path.display())]
    TemplateRead {
        /// Path of the template file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The transport rejected or failed to deliver the message.
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Errors returned by a [`Publisher`](crate::Publisher) implementation.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The service returned an error for the request.
    #[error("service error: {0}")]
    Service(String),

    /// The request was throttled by the service.
    #[error("request throttled")]
    Throttled,

    /// A network or connection error occurred.
    #[error("connection error: {0}")]
    Connection(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The credentials were rejected or could not be loaded.
    #[error("credential error: {0}")]
    Credentials(String),

    /// The client could not be configured from the resolved settings.
    #[error("invalid client configuration: {0}")]
    Configuration(String),
}

impl PublishError {
    /// Returns `true` if a later attempt might succeed.
    ///
    /// The reporter never retries on its own; this is for hosts that do.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Throttled | Self::Connection(_) | Self::Timeout)
    }
}
