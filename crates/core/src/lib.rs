//! Core of the provisioning-run notifier.
//!
//! At the end of a configuration-management run the host hands over a
//! [`RunReport`]. The [`Reporter`] then:
//!
//! 1. validates the [`HandlerConfig`], backfilling credentials from the
//!    node's instance metadata ([`InstanceMetadata`]) when they were not
//!    configured explicitly,
//! 2. asks the activity [`gate`] whether this run should be announced at all,
//! 3. renders the subject and body through the [`format`] module, and
//! 4. publishes the message through a [`Publisher`] built once from the
//!    resolved credentials.
//!
//! Every failure is returned to the caller as a [`ReportError`]; nothing is
//! retried here.

pub mod config;
pub mod error;
pub mod format;
pub mod gate;
pub mod log;
pub mod metadata;
pub mod outcome;
pub mod publisher;
pub mod report;
pub mod reporter;

#[cfg(test)]
mod test_support;

pub use config::{ConfigValue, FIELDS, Field, FieldKind, FieldSpec, HandlerConfig};
pub use error::{PublishError, ReportError};
pub use format::RenderedMessage;
pub use log::{LogPublisher, LogPublisherFactory};
pub use metadata::InstanceMetadata;
pub use outcome::ReportOutcome;
pub use publisher::{ClientCredentials, PublishReceipt, PublishRequest, Publisher, PublisherFactory};
pub use report::{NodeInfo, RunReport, RunStatus};
pub use reporter::Reporter;
