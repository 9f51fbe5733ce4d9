//! Kafka producer and consumer with typed handler dispatch.
//!
//! Producers tag every record with an `@type` header naming the payload's
//! type. Consumers look that identifier up in a [`HandlerRegistry`], decode
//! the payload with the type's codec and call the registered handler with a
//! [`MessageContext`] describing the record.
//!
//! Features:
//!
//! - Typed Handlers: register `async fn(MessageContext, T)` callbacks per message type
//! - Pluggable Codecs: JSON by default, any [`Codec`] per message type
//! - Fallback Handler: receives untagged records and unknown types as raw bytes
//! - Graceful Shutdown: cancellation drains the consumer and commits processed offsets
//! - Health Checks: broker liveness probes for both producer and consumer

/// Consumer loop, lifecycle and configuration
///
/// Subscribes to the configured topics and dispatches each record through
/// the handler registry until cancelled.
pub mod consumer;
pub mod context;
pub mod error;
pub mod handler;
mod health;
pub mod producer;
pub mod registry;

// Re-export main types for easy access
pub use consumer::{Consumer, ConsumerConfig, ConsumerState, HandlerErrorPolicy};
pub use context::MessageContext;
pub use error::{Error, Result};
pub use handler::{handler, Handler, HandlerFuture};
pub use producer::{Producer, ProducerConfig};
pub use registry::{Dispatch, HandlerRegistry};

pub use kafka_types::{
    kafka_message, type_identifier, Codec, CodecError, JsonCodec, KafkaMessage, Record,
    MESSAGE_TYPE_HEADER,
};
