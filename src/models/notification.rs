//! Outgoing messages and the result of a check.

use serde::Serialize;

/// A plain-text message handed to a notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub sender: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// What a single invocation did.
///
/// `message_id` is the notifier's delivery identifier when a message was
/// sent and `None` when the check passed silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub message_id: Option<String>,

    /// Number of prefixes with at least one manifest.
    pub prefixes: usize,

    /// Number of those prefixes whose latest manifest is too old.
    /// Always zero in test mode, where staleness is not evaluated.
    pub stale: usize,
}
