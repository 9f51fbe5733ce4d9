//! Typed Kafka producer.
//!
//! Encodes payloads with their declared codec and tags every record with an
//! `@type` header so consumers can route it to the matching handler.

use crate::error::{Error, Result};
use crate::health;
use kafka_types::{KafkaMessage, MESSAGE_TYPE_HEADER};
use rdkafka::config::ClientConfig;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer as RdkafkaProducer};
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for Kafka producer
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Kafka broker addresses
    pub brokers: Vec<String>,
    /// librdkafka `message.timeout.ms`: how long a record may wait for delivery
    pub message_timeout_ms: String,
    /// How long `send` may wait for room in the local producer queue
    pub queue_timeout: Duration,
    /// Timeout of the metadata request used for connection checks
    pub metadata_timeout: Duration,
    /// Fail `connect` when the cluster cannot be reached
    pub verify_connection: bool,
    /// Additional librdkafka properties, applied last
    pub extra: Vec<(String, String)>,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:9092".to_string()],
            message_timeout_ms: "5000".to_string(),
            queue_timeout: Duration::from_secs(5),
            metadata_timeout: Duration::from_secs(5),
            verify_connection: true,
            extra: Vec::new(),
        }
    }
}

impl ProducerConfig {
    pub fn new(brokers: Vec<String>) -> Self {
        Self {
            brokers,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.brokers.iter().all(|b| b.trim().is_empty()) {
            return Err(Error::InvalidConfig(
                "At least one broker address is required".to_string(),
            ));
        }
        Ok(())
    }

    fn client_config(&self) -> ClientConfig {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", self.brokers.join(","))
            .set("message.timeout.ms", &self.message_timeout_ms);
        for (key, value) in &self.extra {
            client_config.set(key, value);
        }
        client_config
    }
}

/// Kafka producer publishing typed payloads
pub struct Producer {
    producer: FutureProducer,
    config: ProducerConfig,
}

impl Producer {
    /// Create a producer.
    ///
    /// Fails with [`Error::InvalidConfig`] when no broker is given, and with
    /// [`Error::Connection`] when `verify_connection` is set and the cluster
    /// does not answer a metadata request in time.
    pub async fn connect(config: ProducerConfig) -> Result<Self> {
        config.validate()?;

        let producer: FutureProducer = config
            .client_config()
            .create()
            .map_err(|e| Error::InvalidConfig(format!("Failed to create producer: {e}")))?;

        if config.verify_connection {
            let probe = producer.clone();
            let timeout = config.metadata_timeout;
            let brokers =
                health::fetch_broker_count(move || probe.client().fetch_metadata(None, timeout))
                    .await
                    .map_err(|e| {
                        Error::Connection(format!(
                            "Failed to reach brokers {}: {e}",
                            config.brokers.join(",")
                        ))
                    })?;
            debug!("Producer connected to a cluster of {brokers} broker(s)");
        }

        info!("Producer created for brokers {}", config.brokers.join(","));

        Ok(Self { producer, config })
    }

    /// Encode `message` and publish it to `topic`, tagged with its type identifier.
    ///
    /// Waits for the delivery report. Returns [`Error::Encode`] without
    /// publishing anything when the payload cannot be encoded.
    pub async fn send<T: KafkaMessage>(
        &self,
        topic: &str,
        key: impl AsRef<[u8]>,
        message: &T,
    ) -> Result<()> {
        let payload = kafka_types::encode(message).map_err(Error::Encode)?;
        let message_type = T::message_type();
        self.publish(topic, key.as_ref(), &payload, Some(&message_type)).await
    }

    /// Publish an already encoded payload.
    ///
    /// The record gets an `@type` header only when `message_type` is given;
    /// untagged records are routed to the consumer's fallback.
    pub async fn send_raw(
        &self,
        topic: &str,
        key: impl AsRef<[u8]>,
        payload: &[u8],
        message_type: Option<&str>,
    ) -> Result<()> {
        self.publish(topic, key.as_ref(), payload, message_type).await
    }

    async fn publish(
        &self,
        topic: &str,
        key: &[u8],
        payload: &[u8],
        message_type: Option<&str>,
    ) -> Result<()> {
        let mut record = FutureRecord::to(topic).key(key).payload(payload);
        if let Some(message_type) = message_type {
            record = record.headers(OwnedHeaders::new().insert(Header {
                key: MESSAGE_TYPE_HEADER,
                value: Some(message_type),
            }));
        }

        let (partition, offset) = self
            .producer
            .send(record, self.config.queue_timeout)
            .await
            .map_err(|(err, _)| err)?;

        debug!(
            "Published {} record to {topic}[{partition}]@{offset}",
            message_type.unwrap_or("untagged")
        );
        Ok(())
    }

    /// `true` while the cluster answers metadata requests.
    pub async fn health_check(&self) -> bool {
        let probe = self.producer.clone();
        let timeout = self.config.metadata_timeout;
        health::is_healthy(move || probe.client().fetch_metadata(None, timeout)).await
    }

    pub fn config(&self) -> &ProducerConfig {
        &self.config
    }

    /// Get the underlying producer (for advanced use cases)
    pub fn inner(&self) -> &FutureProducer {
        &self.producer
    }
}
