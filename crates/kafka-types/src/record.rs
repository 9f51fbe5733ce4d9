//! Kafka message records.
//!
//! Broker-independent view of a delivered (or about to be published) record.
//! The client crate converts `rdkafka` messages into [`Record`]s before
//! handing them to the dispatch engine, which keeps routing logic testable
//! without a broker.

use std::collections::HashMap;

use crate::message_type::MESSAGE_TYPE_HEADER;

/// A Kafka record with metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// Kafka topic name
    pub topic: String,
    /// Kafka partition number
    pub partition: i32,
    /// Kafka offset within the partition
    pub offset: i64,
    /// Message key (if any)
    pub key: Option<Vec<u8>>,
    /// Raw payload; empty when the broker message carried none
    pub value: Vec<u8>,
    /// Record headers. Headers without a value are not kept, and a repeated
    /// key keeps its last value.
    pub headers: HashMap<String, Vec<u8>>,
    /// Message timestamp in milliseconds since epoch (if available)
    pub timestamp: Option<i64>,
}

impl Record {
    pub fn new(topic: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Tag the record with a type identifier.
    pub fn with_message_type(self, message_type: &str) -> Self {
        self.with_header(MESSAGE_TYPE_HEADER, message_type.as_bytes())
    }

    pub fn header(&self, key: &str) -> Option<&[u8]> {
        self.headers.get(key).map(Vec::as_slice)
    }

    /// Type identifier carried in the `@type` header.
    ///
    /// Returns `None` when the header is missing or is not valid UTF-8.
    pub fn message_type(&self) -> Option<&str> {
        let raw = self.header(MESSAGE_TYPE_HEADER)?;
        match std::str::from_utf8(raw) {
            Ok(message_type) => Some(message_type),
            Err(e) => {
                tracing::warn!(
                    "Ignoring non UTF-8 {MESSAGE_TYPE_HEADER} header on {}[{}]@{}: {e}",
                    self.topic,
                    self.partition,
                    self.offset
                );
                None
            }
        }
    }
}
