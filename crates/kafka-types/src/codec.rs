//! Payload codecs.
//!
//! A payload type implements [`KafkaMessage`] to say which [`Codec`] turns it
//! into record bytes and back. Most types use [`JsonCodec`]; a type that needs
//! its own wire representation implements [`Codec`] itself and names it as its
//! codec:
//!
//! ```rust
//! use kafka_types::{kafka_message, Codec, CodecError};
//!
//! #[derive(Debug, PartialEq)]
//! struct Pair {
//!     id: String,
//!     name: String,
//! }
//!
//! impl Codec<Pair> for Pair {
//!     fn encode(value: &Pair) -> Result<Vec<u8>, CodecError> {
//!         Ok(format!("{};{}", value.id, value.name).into_bytes())
//!     }
//!
//!     fn decode(bytes: &[u8]) -> Result<Pair, CodecError> {
//!         let text = std::str::from_utf8(bytes).map_err(|e| CodecError::decode("Pair", e))?;
//!         let (id, name) = text
//!             .split_once(';')
//!             .ok_or_else(|| CodecError::decode("Pair", "missing ';' separator"))?;
//!         Ok(Pair { id: id.to_string(), name: name.to_string() })
//!     }
//! }
//!
//! kafka_message!(Pair, codec = Pair);
//!
//! let pair = Pair { id: "1".into(), name: "one".into() };
//! let bytes = kafka_types::encode(&pair).unwrap();
//! assert_eq!(bytes, b"1;one");
//! assert_eq!(kafka_types::decode::<Pair>(&bytes).unwrap(), pair);
//! ```
//!
//! Codecs own the round-trip law `decode(encode(v)) == v`. [`JsonCodec`]
//! guarantees it for any value serde can represent; custom codecs are
//! responsible for it themselves.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CodecError, Result};
use crate::message_type::type_identifier;

/// Turns values of `T` into payload bytes and back.
pub trait Codec<T> {
    fn encode(value: &T) -> Result<Vec<u8>>;

    fn decode(bytes: &[u8]) -> Result<T>;
}

/// Default structured codec: JSON through `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T> Codec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| CodecError::encode(type_identifier::<T>(), e))
    }

    fn decode(bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::decode(type_identifier::<T>(), e))
    }
}

/// A payload type that can be published and routed by type.
///
/// Use [`kafka_message!`](crate::kafka_message) for the common cases.
pub trait KafkaMessage: Sized {
    /// Codec used in both directions.
    type Codec: Codec<Self>;

    /// Identifier written to the `@type` header and used as the handler key.
    fn message_type() -> String {
        type_identifier::<Self>()
    }
}

/// Encode a payload with its declared codec.
pub fn encode<T: KafkaMessage>(value: &T) -> Result<Vec<u8>> {
    T::Codec::encode(value)
}

/// Decode a payload with its declared codec.
pub fn decode<T: KafkaMessage>(bytes: &[u8]) -> Result<T> {
    T::Codec::decode(bytes)
}

/// Implement [`KafkaMessage`] for a type.
///
/// ```rust
/// # use serde::{Deserialize, Serialize};
/// # use kafka_types::{kafka_message, JsonCodec, KafkaMessage};
/// #[derive(Serialize, Deserialize)]
/// struct OrderPlaced { id: String }
/// #[derive(Serialize, Deserialize)]
/// struct OrderShipped { id: String }
/// #[derive(Serialize, Deserialize)]
/// struct OrderCancelled { id: String }
///
/// // JSON payload, identifier "OrderPlaced"
/// kafka_message!(OrderPlaced);
/// // JSON payload, explicit identifier
/// kafka_message!(OrderShipped, name = "orders.shipped");
/// // explicit codec
/// kafka_message!(OrderCancelled, codec = JsonCodec);
///
/// assert_eq!(OrderPlaced::message_type(), "OrderPlaced");
/// assert_eq!(OrderShipped::message_type(), "orders.shipped");
/// ```
#[macro_export]
macro_rules! kafka_message {
    ($ty:ty, codec = $codec:ty, name = $name:expr) => {
        impl $crate::KafkaMessage for $ty {
            type Codec = $codec;

            fn message_type() -> String {
                ::std::string::ToString::to_string($name)
            }
        }
    };
    ($ty:ty, codec = $codec:ty) => {
        impl $crate::KafkaMessage for $ty {
            type Codec = $codec;
        }
    };
    ($ty:ty, name = $name:expr) => {
        $crate::kafka_message!($ty, codec = $crate::JsonCodec, name = $name);
    };
    ($ty:ty) => {
        $crate::kafka_message!($ty, codec = $crate::JsonCodec);
    };
}
