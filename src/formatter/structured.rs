//! JSON and MessagePack encodings of log events.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use rmp_serde::Serializer;
use serde::Serialize;

use super::{FormatError, Formatter};
use crate::log_record::LogEvent;

#[derive(Serialize)]
struct SerializableEvent<'a> {
    timestamp: String,
    logger: &'a str,
    level: &'a str,
    message: &'a str,
    module_path: &'a str,
    filename: &'a str,
    line_number: u32,
    thread_name: Option<&'a str>,
    #[serde(skip_serializing_if = "no_key_values")]
    key_values: &'a BTreeMap<String, String>,
}

fn no_key_values(key_values: &&BTreeMap<String, String>) -> bool {
    key_values.is_empty()
}

impl<'a> From<&'a LogEvent> for SerializableEvent<'a> {
    fn from(event: &'a LogEvent) -> Self {
        let metadata = event.metadata();
        let timestamp: DateTime<Utc> = metadata.timestamp.into();
        Self {
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            logger: event.logger(),
            level: event.level_str(),
            message: event.message(),
            module_path: &metadata.module_path,
            filename: &metadata.filename,
            line_number: metadata.line_number,
            thread_name: metadata.thread_name.as_deref(),
            key_values: &metadata.key_values,
        }
    }
}

/// Encodes each event as a single JSON object.
#[derive(Copy, Clone, Debug, Default)]
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, event: &LogEvent) -> Result<Vec<u8>, FormatError> {
        Ok(serde_json::to_vec(&SerializableEvent::from(event))?)
    }
}

/// Encodes each event as a MessagePack map keyed by field name.
#[derive(Copy, Clone, Debug, Default)]
pub struct MsgPackFormatter;

impl Formatter for MsgPackFormatter {
    fn format(&self, event: &LogEvent) -> Result<Vec<u8>, FormatError> {
        let mut buf = Vec::with_capacity(128);
        SerializableEvent::from(event).serialize(&mut Serializer::new(&mut buf).with_struct_map())?;
        Ok(buf)
    }
}
