//! Amazon SNS transport for provision-notify.
//!
//! [`SnsPublisherFactory`] builds an [`SnsPublisher`] from the credentials the
//! core crate resolved (explicit configuration or instance metadata). The
//! SDK client is created once per reporter and reused.

pub mod auth;
pub mod error;
pub mod sns;

// Re-exports for convenience.
pub use error::AwsProviderError;
pub use sns::{SnsPublisher, SnsPublisherFactory};
