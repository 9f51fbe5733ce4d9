//! typed-kafka
//!
//! Typed message dispatch on top of Kafka: producers tag each record with the
//! type identifier of its payload, consumers route records to per-type handlers.
//!
//! # Features
//!
//! - Typed handlers: one async callback per message type, payloads decoded for you
//! - Pluggable codecs: JSON by default, custom wire formats per message type
//! - Fallback: untagged records and unknown types are delivered as raw bytes
//! - Graceful shutdown: cancellation commits processed offsets before returning
//!
//! # Crates
//!
//! - `kafka_types` - codec contract, type identifiers and records (no broker dependency)
//! - `typed_kafka_client` - producer, consumer and handler registry on `rdkafka`
//!
//! # CLI Usage
//!
//! ```bash
//! # Publish a tagged JSON payload
//! typed-kafka produce --brokers localhost:9092 --topic orders --key order-1 \
//!   --message-type OrderPlaced --payload '{"id":"order-1"}'
//!
//! # Log every record of two topics until Ctrl+C
//! typed-kafka consume --brokers localhost:9092 --group-id inspector --topics orders,payments
//! ```

pub mod testing;

pub use kafka_types;
pub use typed_kafka_client as client;

pub use typed_kafka_client::{
    handler, kafka_message, Codec, CodecError, Consumer, ConsumerConfig, ConsumerState, Dispatch,
    Error, Handler, HandlerErrorPolicy, HandlerRegistry, JsonCodec, KafkaMessage, MessageContext,
    Producer, ProducerConfig, Record, Result, MESSAGE_TYPE_HEADER,
};
