//! Timestamped message values passed from producer to consumer.

use std::fmt;

use chrono::{DateTime, Local};

/// Text carried by every message the producer emits.
pub const DEFAULT_TEXT: &str = "Message";

/// One timestamped event. Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    timestamp: DateTime<Local>,
    text: String,
}

impl Message {
    /// Creates a message stamped with `timestamp` and the fixed text.
    #[inline]
    pub fn new(timestamp: DateTime<Local>) -> Self {
        Self::with_text(timestamp, DEFAULT_TEXT)
    }

    pub fn with_text(timestamp: DateTime<Local>, text: impl Into<String>) -> Self {
        Self {
            timestamp,
            text: text.into(),
        }
    }

    /// Creates a message stamped with the current wall-clock time.
    pub fn now() -> Self {
        Self::new(Local::now())
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Human-readable form, identical to the `Display` output.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp: {} Message: {}", self.timestamp, self.text)
    }
}
