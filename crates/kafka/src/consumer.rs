use crate::context::MessageContext;
use crate::error::{Error, Result};
use crate::handler::Handler;
use crate::health;
use crate::registry::{Dispatch, HandlerRegistry};
use kafka_types::{KafkaMessage, Record};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{
    CommitMode, Consumer as RdkafkaConsumer, StreamConsumer as RdkafkaStreamConsumer,
};
use rdkafka::error::KafkaError;
use rdkafka::message::{
    BorrowedMessage as RdkafkaBorrowedMessage, Headers, Message as RdkafkaMessage,
};
use rdkafka::types::RDKafkaErrorCode;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What the consume loop does when a handler (or its decode step) fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HandlerErrorPolicy {
    /// Log the error, store the record's offset and keep consuming.
    #[default]
    Continue,
    /// Stop consuming and return the error from `start`. The failing
    /// record's offset is not stored, so it is redelivered to the group.
    Stop,
}

impl FromStr for HandlerErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "continue" => Ok(HandlerErrorPolicy::Continue),
            "stop" => Ok(HandlerErrorPolicy::Stop),
            other => Err(format!(
                "Unknown handler error policy '{other}' (expected 'continue' or 'stop')"
            )),
        }
    }
}

/// Configuration for Kafka consumer
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Kafka broker addresses
    pub brokers: Vec<String>,
    /// Consumer group ID
    pub group_id: String,
    /// Topics to subscribe to
    ///
    /// Records from every topic go through the same handler registry; the
    /// handler can tell them apart with [`MessageContext::topic`].
    pub topics: Vec<String>,
    /// Auto offset reset strategy ("earliest" or "latest")
    ///
    /// "earliest" means the consumer will start from the beginning of the topic
    /// if no committed offsets are found for the consumer group.
    pub auto_offset_reset: String,
    /// Session timeout in milliseconds
    pub session_timeout_ms: String,
    /// Timeout of the metadata request used for connection checks
    pub metadata_timeout: Duration,
    /// Fail `connect` when the cluster cannot be reached
    pub verify_connection: bool,
    /// What to do when a handler fails
    pub on_handler_error: HandlerErrorPolicy,
    /// Additional librdkafka properties, applied last
    pub extra: Vec<(String, String)>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:9092".to_string()],
            group_id: "typed-kafka-consumer".to_string(),
            topics: Vec::new(),
            auto_offset_reset: "earliest".to_string(),
            session_timeout_ms: "6000".to_string(),
            metadata_timeout: Duration::from_secs(5),
            verify_connection: true,
            on_handler_error: HandlerErrorPolicy::Continue,
            extra: Vec::new(),
        }
    }
}

impl ConsumerConfig {
    pub fn new(brokers: Vec<String>, group_id: impl Into<String>, topics: Vec<String>) -> Self {
        Self {
            brokers,
            group_id: group_id.into(),
            topics,
            ..Default::default()
        }
    }

    /// Check the arguments every consumer needs.
    pub fn validate(&self) -> Result<()> {
        if self.brokers.iter().all(|b| b.trim().is_empty()) {
            return Err(Error::InvalidConfig(
                "At least one broker address is required".to_string(),
            ));
        }
        if self.group_id.trim().is_empty() {
            return Err(Error::InvalidConfig("Consumer group ID is required".to_string()));
        }
        if self.topics.iter().all(|t| t.trim().is_empty()) {
            return Err(Error::InvalidConfig("At least one topic is required".to_string()));
        }
        Ok(())
    }

    fn client_config(&self) -> ClientConfig {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", self.brokers.join(","))
            .set("group.id", &self.group_id)
            .set("enable.auto.commit", "true")
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", &self.auto_offset_reset)
            .set("session.timeout.ms", &self.session_timeout_ms)
            .set("enable.partition.eof", "false");
        for (key, value) in &self.extra {
            client_config.set(key, value);
        }
        client_config
    }
}

/// Lifecycle of a [`Consumer`].
///
/// `Created -> Consuming -> Draining -> Stopped`. A stopped consumer cannot be
/// restarted; construct a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConsumerState {
    Created = 0,
    Consuming = 1,
    Draining = 2,
    Stopped = 3,
}

impl ConsumerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConsumerState::Created,
            1 => ConsumerState::Consuming,
            2 => ConsumerState::Draining,
            _ => ConsumerState::Stopped,
        }
    }
}

impl fmt::Display for ConsumerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConsumerState::Created => "created",
            ConsumerState::Consuming => "consuming",
            ConsumerState::Draining => "draining",
            ConsumerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Kafka consumer that routes records to typed handlers
///
/// Register handlers while holding the consumer mutably, then drive it with
/// [`Consumer::start`]. Registration needs `&mut self` and `start` only needs
/// `&self`, so a consumer shared across tasks (e.g. in an `Arc`) for
/// consuming can no longer have its registry changed.
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use serde::{Deserialize, Serialize};
/// # use tokio_util::sync::CancellationToken;
/// # use typed_kafka_client::{Consumer, ConsumerConfig, MessageContext};
/// #[derive(Debug, Serialize, Deserialize)]
/// struct OrderPlaced {
///     id: String,
/// }
///
/// kafka_types::kafka_message!(OrderPlaced);
///
/// # async fn run() -> typed_kafka_client::Result<()> {
/// let config = ConsumerConfig::new(
///     vec!["localhost:9092".to_string()],
///     "orders",
///     vec!["orders".to_string()],
/// );
/// let mut consumer = Consumer::connect(config).await?;
/// consumer.add_handler_for(|context: MessageContext, order: OrderPlaced| async move {
///     tracing::info!("{:?} from {:?}", order, context.topic());
///     Ok::<_, anyhow::Error>(())
/// });
///
/// let shutdown = CancellationToken::new();
/// let consumer = Arc::new(consumer);
/// let task = tokio::spawn({
///     let consumer = Arc::clone(&consumer);
///     let shutdown = shutdown.clone();
///     async move { consumer.start(shutdown).await }
/// });
///
/// shutdown.cancel();
/// task.await.expect("consumer task panicked")?;
/// # Ok(())
/// # }
/// ```
pub struct Consumer {
    consumer: Arc<RdkafkaStreamConsumer>,
    config: ConsumerConfig,
    registry: HandlerRegistry,
    state: AtomicU8,
}

impl Consumer {
    /// Create a consumer and subscribe it to the configured topics.
    ///
    /// Fails with [`Error::InvalidConfig`] on missing brokers, group ID or
    /// topics, and with [`Error::Connection`] when `verify_connection` is set
    /// and the cluster does not answer a metadata request in time.
    pub async fn connect(config: ConsumerConfig) -> Result<Self> {
        config.validate()?;

        let consumer: RdkafkaStreamConsumer = config
            .client_config()
            .create()
            .map_err(|e| Error::InvalidConfig(format!("Failed to create consumer: {e}")))?;
        let consumer = Arc::new(consumer);

        if config.verify_connection {
            let probe = Arc::clone(&consumer);
            let timeout = config.metadata_timeout;
            let brokers =
                health::fetch_broker_count(move || probe.fetch_metadata(None, timeout))
                    .await
                    .map_err(|e| {
                        Error::Connection(format!(
                            "Failed to reach brokers {}: {e}",
                            config.brokers.join(",")
                        ))
                    })?;
            debug!("Consumer connected to a cluster of {brokers} broker(s)");
        }

        let topics: Vec<&str> = config.topics.iter().map(String::as_str).collect();
        consumer.subscribe(&topics)?;

        info!(
            "Consumer in group '{}' subscribed to topics {:?}",
            config.group_id, config.topics
        );

        Ok(Self {
            consumer,
            config,
            registry: HandlerRegistry::new(),
            state: AtomicU8::new(ConsumerState::Created as u8),
        })
    }

    /// Register a handler under an explicit type identifier.
    pub fn add_handler(&mut self, message_type: impl Into<String>, handler: Handler) -> &mut Self {
        self.registry.add_handler(message_type, handler);
        self
    }

    /// Register a typed callback under `T::message_type()`.
    pub fn add_handler_for<T, F, Fut>(&mut self, callback: F) -> &mut Self
    where
        T: KafkaMessage + Send + 'static,
        F: Fn(MessageContext, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.registry.add_handler_for(callback);
        self
    }

    /// Set the handler for untagged records and unknown type identifiers.
    pub fn add_fallback<F, Fut>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(MessageContext, Vec<u8>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.registry.add_fallback(Handler::raw(callback));
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    pub fn state(&self) -> ConsumerState {
        ConsumerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Consume and dispatch records until `shutdown` is cancelled.
    ///
    /// Returns `Ok(())` after a cancellation, once stored offsets have been
    /// committed and the subscription closed. Returns the broker error when
    /// the client reports a fatal one, and [`Error::Handler`] when a handler
    /// fails under [`HandlerErrorPolicy::Stop`].
    pub async fn start(&self, shutdown: CancellationToken) -> Result<()> {
        self.state
            .compare_exchange(
                ConsumerState::Created as u8,
                ConsumerState::Consuming as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .map_err(|current| Error::InvalidState(ConsumerState::from_u8(current)))?;

        info!(
            "Consumer in group '{}' started with {} handler(s){}",
            self.config.group_id,
            self.registry.len(),
            if self.registry.has_fallback() {
                " and a fallback"
            } else {
                ""
            }
        );

        let outcome = self.consume(&shutdown).await;

        self.state.store(ConsumerState::Draining as u8, Ordering::SeqCst);
        self.drain();
        self.state.store(ConsumerState::Stopped as u8, Ordering::SeqCst);

        match &outcome {
            Ok(()) => info!("Consumer in group '{}' stopped", self.config.group_id),
            Err(e) => error!("Consumer in group '{}' stopped: {e}", self.config.group_id),
        }
        outcome
    }

    async fn consume(&self, shutdown: &CancellationToken) -> Result<()> {
        loop {
            let received = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, draining consumer");
                    return Ok(());
                }
                received = self.consumer.recv() => received,
            };

            let msg = match received {
                Ok(msg) => msg,
                Err(e) if is_fatal(&e) => return Err(Error::Kafka(e)),
                Err(e) => {
                    warn!("Error receiving message: {e}");
                    continue;
                }
            };

            self.process(record_from_message(&msg), shutdown).await?;

            if let Err(e) = self.consumer.store_offset_from_message(&msg) {
                warn!(
                    "Failed to store offset for {}[{}]@{}: {e}",
                    msg.topic(),
                    msg.partition(),
                    msg.offset()
                );
            }
        }
    }

    /// Dispatch one record and apply the handler error policy.
    ///
    /// `Ok` means the record's offset may be stored.
    async fn process(&self, record: Record, shutdown: &CancellationToken) -> Result<()> {
        let topic = record.topic.clone();
        let partition = record.partition;
        let offset = record.offset;
        let message_type = record.message_type().unwrap_or_default().to_string();

        debug!("Received {message_type:?} record from {topic}[{partition}]@{offset}");

        let failure = match self.registry.dispatch(record, shutdown).await {
            Dispatch::Handled(result) | Dispatch::Fallback(result) => result.err(),
            Dispatch::Dropped => {
                debug!(
                    "No handler for message type {message_type:?}, dropping {topic}[{partition}]@{offset}"
                );
                None
            }
        };

        if let Some(e) = failure {
            match self.config.on_handler_error {
                HandlerErrorPolicy::Continue => {
                    error!(
                        "Handler for message type {message_type:?} failed on {topic}[{partition}]@{offset}: {e:#}"
                    );
                }
                HandlerErrorPolicy::Stop => {
                    return Err(Error::Handler {
                        message_type,
                        source: e,
                    });
                }
            }
        }
        Ok(())
    }

    /// Commit stored offsets and leave the group.
    fn drain(&self) {
        match self.consumer.commit_consumer_state(CommitMode::Sync) {
            Ok(()) => debug!("Committed consumer offsets"),
            Err(KafkaError::ConsumerCommit(RDKafkaErrorCode::NoOffset)) => {
                debug!("No new offsets to commit")
            }
            Err(e) => warn!("Failed to commit offsets on shutdown: {e}"),
        }
        self.consumer.unsubscribe();
    }

    /// `true` while the cluster answers metadata requests.
    pub async fn health_check(&self) -> bool {
        let probe = Arc::clone(&self.consumer);
        let timeout = self.config.metadata_timeout;
        health::is_healthy(move || probe.fetch_metadata(None, timeout)).await
    }

    /// Get the underlying consumer (for advanced use cases)
    pub fn inner(&self) -> &RdkafkaStreamConsumer {
        &self.consumer
    }
}

fn is_fatal(err: &KafkaError) -> bool {
    matches!(err, KafkaError::MessageConsumptionFatal(_))
        || err.rdkafka_error_code() == Some(RDKafkaErrorCode::Fatal)
}

fn record_from_message(msg: &RdkafkaBorrowedMessage) -> Record {
    let mut headers = HashMap::new();
    if let Some(msg_headers) = msg.headers() {
        for header in msg_headers.iter() {
            if let Some(value) = header.value {
                headers.insert(header.key.to_string(), value.to_vec());
            }
        }
    }

    Record {
        topic: msg.topic().to_string(),
        partition: msg.partition(),
        offset: msg.offset(),
        key: msg.key().map(|k| k.to_vec()),
        value: msg.payload().map(|p| p.to_vec()).unwrap_or_default(),
        headers,
        timestamp: msg.timestamp().to_millis(),
    }
}
