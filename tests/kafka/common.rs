use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use typed_kafka::testing::{create_topic_if_not_exists, generate_test_id, kafka_broker};
use typed_kafka::{kafka_message, Codec, CodecError, Consumer, ConsumerConfig, ProducerConfig};

/// How long a test waits for a record to be delivered to a handler
pub const RECEIVE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentTestingMessage {
    pub id: String,
    pub name: String,
}

kafka_message!(SentTestingMessage);

pub fn testing_message() -> SentTestingMessage {
    SentTestingMessage {
        id: "testing-message-id".to_string(),
        name: "testing-message-name".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnregisteredMessage {
    pub value: u32,
}

kafka_message!(UnregisteredMessage);

/// Payload with a "id;name" wire format instead of JSON
#[derive(Debug, Clone, PartialEq)]
pub struct CustomEncodingDecodingMessage {
    pub id: String,
    pub name: String,
}

impl Codec<CustomEncodingDecodingMessage> for CustomEncodingDecodingMessage {
    fn encode(value: &Self) -> Result<Vec<u8>, CodecError> {
        Ok(format!("{};{}", value.id, value.name).into_bytes())
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| CodecError::decode("CustomEncodingDecodingMessage", e))?;
        let (id, name) = text.split_once(';').ok_or_else(|| {
            CodecError::decode("CustomEncodingDecodingMessage", "missing ';' separator")
        })?;
        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
        })
    }
}

kafka_message!(
    CustomEncodingDecodingMessage,
    codec = CustomEncodingDecodingMessage
);

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("typed_kafka=debug,typed_kafka_client=debug")
        .try_init()
        .ok();
}

/// Unique topic and group names for one test, with the topic created.
pub struct TestNames {
    pub topic: String,
    pub group_id: String,
}

impl TestNames {
    pub async fn create(prefix: &str) -> anyhow::Result<Self> {
        let test_id = generate_test_id();
        let names = Self {
            topic: format!("test-{prefix}-{test_id}"),
            group_id: format!("test-group-{prefix}-{test_id}"),
        };
        tracing::info!("Using topic={} group={}", names.topic, names.group_id);

        create_topic_if_not_exists(&kafka_broker(), &names.topic, 1).await?;
        // Give Kafka a moment to propagate topic metadata
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(names)
    }

    pub fn producer_config(&self) -> ProducerConfig {
        ProducerConfig::new(vec![kafka_broker()])
    }

    pub fn consumer_config(&self) -> ConsumerConfig {
        ConsumerConfig::new(
            vec![kafka_broker()],
            self.group_id.clone(),
            vec![self.topic.clone()],
        )
    }

    pub async fn cleanup(&self) -> anyhow::Result<()> {
        typed_kafka::testing::delete_topic(&kafka_broker(), &self.topic).await
    }
}

/// A consumer running on its own task.
pub struct RunningConsumer {
    pub consumer: Arc<Consumer>,
    pub shutdown: CancellationToken,
    pub handle: JoinHandle<typed_kafka::Result<()>>,
}

impl RunningConsumer {
    pub fn spawn(consumer: Consumer) -> Self {
        let consumer = Arc::new(consumer);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn({
            let consumer = Arc::clone(&consumer);
            let shutdown = shutdown.clone();
            async move { consumer.start(shutdown).await }
        });
        Self {
            consumer,
            shutdown,
            handle,
        }
    }

    /// Cancel the consumer and wait for `start` to return.
    pub async fn stop(self) -> anyhow::Result<(Arc<Consumer>, typed_kafka::Result<()>)> {
        self.shutdown.cancel();
        let result = tokio::time::timeout(RECEIVE_TIMEOUT, self.handle).await??;
        Ok((self.consumer, result))
    }
}

/// Receive the next value, failing the test after [`RECEIVE_TIMEOUT`].
pub async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> anyhow::Result<T> {
    tokio::time::timeout(RECEIVE_TIMEOUT, rx.recv())
        .await?
        .ok_or_else(|| anyhow::anyhow!("channel closed before a record arrived"))
}
