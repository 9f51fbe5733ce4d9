//! Shared types for typed-kafka.
//!
//! This crate defines the broker-independent half of typed message dispatch:
//! the payload codec contract, the type identifiers that route records to
//! handlers, and the record type the dispatch engine works on.
//!
//! # Architecture
//!
//! ```text
//! Produce:  value -> Codec::encode -> bytes + "@type" header -> broker
//! Consume:  broker -> Record -> "@type" lookup -> Codec::decode -> handler(value)
//! ```
//!
//! # Modules
//!
//! - [`codec`] - [`Codec`] trait, [`JsonCodec`] default and [`KafkaMessage`]
//! - [`message_type`] - type identifiers and the `@type` header key
//! - [`record`] - [`Record`], the decoded broker message
//! - [`error`] - [`CodecError`]
//!
//! NOTE: NO dependency on `rdkafka`. The client crate converts broker
//! messages into [`Record`].

pub mod codec;
pub mod error;
pub mod message_type;
pub mod record;

// Re-export main types for convenient access
pub use codec::{decode, encode, Codec, JsonCodec, KafkaMessage};
pub use error::{CodecError, Result};
pub use message_type::{strip_module_paths, type_identifier, MESSAGE_TYPE_HEADER};
pub use record::Record;
