//! Test support for broker integration tests
//!
//! Topic administration and unique naming so tests can run in parallel
//! against a shared broker.

use anyhow::{Context, Result};
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::ClientConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Broker used when `KAFKA_BROKER` is not set
pub const DEFAULT_KAFKA_BROKER: &str = "localhost:9092";

// Generate unique test identifiers for parallel execution
static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique test identifier for parallel test execution
pub fn generate_test_id() -> u64 {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    timestamp.wrapping_add(counter)
}

/// Broker address for integration tests, from `KAFKA_BROKER`
pub fn kafka_broker() -> String {
    std::env::var("KAFKA_BROKER").unwrap_or_else(|_| DEFAULT_KAFKA_BROKER.to_string())
}

fn admin_client(broker: &str) -> Result<AdminClient<DefaultClientContext>> {
    ClientConfig::new()
        .set("bootstrap.servers", broker)
        .create()
        .context("Failed to create admin client")
}

fn admin_options() -> AdminOptions {
    AdminOptions::new().operation_timeout(Some(Duration::from_secs(5)))
}

/// Create `topic` with `partitions` partitions; an existing topic is left as is.
pub async fn create_topic_if_not_exists(broker: &str, topic: &str, partitions: i32) -> Result<()> {
    let admin_client = admin_client(broker)?;
    let new_topic = NewTopic::new(topic, partitions, TopicReplication::Fixed(1));

    let results = admin_client
        .create_topics(&[new_topic], &admin_options())
        .await
        .context("Failed to create topics")?;

    for result in results {
        match result {
            Ok(topic_name) => {
                tracing::info!("Topic '{topic_name}' created successfully");
            }
            Err((topic_name, err)) => {
                if err.to_string().contains("already exists") {
                    tracing::info!("Topic '{topic_name}' already exists");
                } else {
                    return Err(anyhow::anyhow!("Failed to create topic '{topic_name}': {err}"));
                }
            }
        }
    }

    Ok(())
}

/// Delete `topic`; a missing topic is not an error.
pub async fn delete_topic(broker: &str, topic: &str) -> Result<()> {
    let admin_client = admin_client(broker)?;

    let results = admin_client
        .delete_topics(&[topic], &admin_options())
        .await
        .context("Failed to delete topics")?;

    for result in results {
        match result {
            Ok(topic_name) => tracing::info!("Topic '{topic_name}' deleted"),
            Err((topic_name, err)) => {
                if err.to_string().contains("does not exist")
                    || err.to_string().contains("Unknown topic")
                {
                    tracing::info!("Topic '{topic_name}' does not exist");
                } else {
                    return Err(anyhow::anyhow!("Failed to delete topic '{topic_name}': {err}"));
                }
            }
        }
    }

    Ok(())
}
