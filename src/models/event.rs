//! The event that triggers a check.

use serde_json::Value;

/// Event key whose presence forces a report regardless of staleness.
pub const TEST_EMAIL_KEY: &str = "testEmail";

/// A parsed invocation event.
///
/// Schedulers hand the monitor an arbitrary JSON document. Only one thing is
/// read from it: whether the top-level object carries `testEmail`. The value
/// of that field is never inspected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvocationEvent {
    pub test_email: bool,
}

impl InvocationEvent {
    /// Event for a connectivity test of the notification path.
    pub fn test_email() -> Self {
        Self { test_email: true }
    }

    pub fn from_json(value: &Value) -> Self {
        Self {
            test_email: value
                .as_object()
                .is_some_and(|fields| fields.contains_key(TEST_EMAIL_KEY)),
        }
    }

    /// Parse raw request bytes. An empty body is a default event.
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_slice(body)?;
        Ok(Self::from_json(&value))
    }
}
