use kafka_types::CodecError;
use thiserror::Error;

use crate::consumer::ConsumerState;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Encode error: {0}")]
    Encode(#[source] CodecError),

    #[error("Decode error: {0}")]
    Decode(#[source] CodecError),

    #[error("Handler for message type '{message_type}' failed: {source}")]
    Handler {
        message_type: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Consumer cannot be started from state {0}")]
    InvalidState(ConsumerState),
}

pub type Result<T> = std::result::Result<T, Error>;
