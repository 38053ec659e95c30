//! Log event representation consumed by sinks.
//!
//! `LogEvent` captures the message together with its contextual metadata
//! such as timestamps, source location and thread information. Sinks only
//! ever read events; the caller that produced an event owns it.

use crate::level::LogLevel;
use std::collections::BTreeMap;
use std::fmt;
use std::thread::{self, ThreadId};
use std::time::SystemTime;

/// Additional context associated with a log event.
#[derive(Clone, Debug)]
pub struct EventMetadata {
    /// Rust module path where the log call originated.
    pub module_path: String,
    /// Source file name for the log call.
    pub filename: String,
    /// Line number in the source file.
    pub line_number: u32,
    /// Time the event was created.
    pub timestamp: SystemTime,
    /// ID of the thread that created the event.
    pub thread_id: ThreadId,
    /// Name of the thread that created the event (if any).
    pub thread_name: Option<String>,
    /// Structured key-value pairs attached to the event.
    pub key_values: BTreeMap<String, String>,
}

impl EventMetadata {
    fn capture_runtime() -> (SystemTime, ThreadId, Option<String>) {
        let current = thread::current();
        (
            SystemTime::now(),
            current.id(),
            current.name().map(ToString::to_string),
        )
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        let (timestamp, thread_id, thread_name) = Self::capture_runtime();
        Self {
            module_path: String::new(),
            filename: String::new(),
            line_number: 0,
            timestamp,
            thread_id,
            thread_name,
            key_values: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LogEvent {
    logger: String,
    level: LogLevel,
    message: String,
    metadata: EventMetadata,
}

impl LogEvent {
    /// Construct a new event from logger `name`, `level`, and `message`.
    pub fn new(logger: &str, level: LogLevel, message: &str) -> Self {
        Self {
            logger: logger.to_owned(),
            level,
            message: message.to_owned(),
            metadata: EventMetadata::default(),
        }
    }

    /// Construct an event with explicit source location and key-values.
    ///
    /// Timestamp and thread details are always recaptured at construction.
    pub fn with_metadata(
        logger: &str,
        level: LogLevel,
        message: &str,
        mut metadata: EventMetadata,
    ) -> Self {
        let (timestamp, thread_id, thread_name) = EventMetadata::capture_runtime();
        metadata.timestamp = timestamp;
        metadata.thread_id = thread_id;
        metadata.thread_name = thread_name;
        Self {
            logger: logger.to_owned(),
            level,
            message: message.to_owned(),
            metadata,
        }
    }

    /// Attach a structured key-value pair.
    pub fn with_key_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.key_values.insert(key.into(), value.into());
        self
    }

    pub fn logger(&self) -> &str {
        &self.logger
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn level_str(&self) -> &'static str {
        self.level.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.level, self.message)
    }
}
