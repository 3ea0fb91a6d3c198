use provision_notify_core::PublishError;
use thiserror::Error;

/// Errors specific to AWS SNS operations.
#[derive(Debug, Error)]
pub enum AwsProviderError {
    /// The AWS SDK returned an error from the service.
    #[error("AWS service error: {0}")]
    ServiceError(String),

    /// The request was throttled by the AWS service.
    #[error("AWS request throttled")]
    Throttled,

    /// A network or connection error occurred communicating with AWS.
    #[error("AWS connection error: {0}")]
    Connection(String),

    /// The request timed out.
    #[error("AWS request timed out")]
    Timeout,

    /// The credentials were rejected.
    #[error("credential error: {0}")]
    CredentialError(String),
}

impl From<AwsProviderError> for PublishError {
    fn from(err: AwsProviderError) -> Self {
        match err {
            AwsProviderError::ServiceError(msg) => PublishError::Service(msg),
            AwsProviderError::Throttled => PublishError::Throttled,
            AwsProviderError::Connection(msg) => PublishError::Connection(msg),
            AwsProviderError::Timeout => PublishError::Timeout,
            AwsProviderError::CredentialError(msg) => PublishError::Credentials(msg),
        }
    }
}

/// Classify an AWS SDK error string into the appropriate [`AwsProviderError`].
///
/// Inspects the message for throttling, credential, timeout, and connection
/// patterns; everything else is a service error.
pub fn classify_sdk_error(error_str: &str) -> AwsProviderError {
    let lower = error_str.to_lowercase();
    if lower.contains("throttl") || lower.contains("rate exceed") || lower.contains("too many") {
        AwsProviderError::Throttled
    } else if lower.contains("invalidclienttokenid")
        || lower.contains("signaturedoesnotmatch")
        || lower.contains("expiredtoken")
        || lower.contains("security token")
    {
        AwsProviderError::CredentialError(error_str.to_owned())
    } else if lower.contains("timeout") || lower.contains("timed out") {
        AwsProviderError::Timeout
    } else if lower.contains("connection")
        || lower.contains("connect")
        || lower.contains("dns")
        || lower.contains("network")
    {
        AwsProviderError::Connection(error_str.to_owned())
    } else {
        AwsProviderError::ServiceError(error_str.to_owned())
    }
}
