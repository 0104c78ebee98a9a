//! Incoming text message

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One received text message, as handed over by the delivery mechanism
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Originating address, when the platform provides one
    pub sender: Option<String>,
    /// Message body; some deliveries carry none
    pub body: Option<String>,
    /// Time the message was handed to the filter
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(sender: Option<String>, body: Option<String>) -> Self {
        Self {
            sender,
            body,
            received_at: Utc::now(),
        }
    }

    /// Message from an unknown sender with the given body
    pub fn with_body(body: impl Into<String>) -> Self {
        Self::new(None, Some(body.into()))
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Sender for display purposes
    pub fn sender_display(&self) -> &str {
        self.sender.as_deref().unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_display() {
        let msg = IncomingMessage::new(Some("+15551234".into()), Some("hi".into()));
        assert_eq!(msg.sender_display(), "+15551234");
        assert_eq!(IncomingMessage::with_body("hi").sender_display(), "unknown");
    }
}
