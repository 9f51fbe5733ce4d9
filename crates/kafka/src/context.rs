//! Per-record handler context.

use kafka_types::Record;
use tokio_util::sync::CancellationToken;

/// Metadata of the record a handler is invoked for.
///
/// Built by the consumer for every delivered record and passed by value to
/// the handler; it does not outlive that invocation. A context created any
/// other way (e.g. [`MessageContext::default`]) carries no record metadata.
#[derive(Debug, Clone, Default)]
pub struct MessageContext {
    topic: Option<String>,
    partition: Option<i32>,
    offset: Option<i64>,
    key: Option<Vec<u8>>,
    message_type: Option<String>,
    cancellation: CancellationToken,
}

impl MessageContext {
    /// A context without record metadata, observing `cancellation`.
    pub fn new(cancellation: CancellationToken) -> Self {
        Self {
            cancellation,
            ..Default::default()
        }
    }

    /// Context for one delivered record.
    pub fn for_record(record: &Record, cancellation: CancellationToken) -> Self {
        Self {
            topic: Some(record.topic.clone()),
            partition: Some(record.partition),
            offset: Some(record.offset),
            key: record.key.clone(),
            message_type: record.message_type().map(str::to_string),
            cancellation,
        }
    }

    /// Topic the record was consumed from; `None` outside a dispatch.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn partition(&self) -> Option<i32> {
        self.partition
    }

    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    pub fn key(&self) -> Option<&[u8]> {
        self.key.as_deref()
    }

    /// Type identifier from the record's `@type` header, if it had one.
    pub fn message_type(&self) -> Option<&str> {
        self.message_type.as_deref()
    }

    /// Cancelled when the consumer that delivered the record shuts down.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
