/// What a report invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The message was handed to the transport.
    Published {
        /// Identifier assigned by the transport.
        message_id: String,
    },
    /// The activity filter suppressed the notification.
    Skipped,
}

impl ReportOutcome {
    /// Returns `true` if a message was published.
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }
}
