//! Cluster liveness checks shared by the producer and the consumer.
//!
//! librdkafka's metadata request is blocking, so it runs on the blocking pool.

use rdkafka::error::KafkaResult;
use rdkafka::metadata::Metadata;

use crate::error::{Error, Result};

/// Run a metadata request and return the number of brokers it reported.
///
/// A cluster that answers with no brokers counts as unreachable.
pub(crate) async fn fetch_broker_count<F>(fetch: F) -> Result<usize>
where
    F: FnOnce() -> KafkaResult<Metadata> + Send + 'static,
{
    let brokers = tokio::task::spawn_blocking(move || fetch().map(|m| m.brokers().len()))
        .await
        .map_err(|e| Error::Connection(format!("Metadata request task failed: {e}")))??;

    match brokers {
        0 => Err(Error::Connection("Cluster metadata lists no brokers".to_string())),
        count => Ok(count),
    }
}

/// Like [`fetch_broker_count`], with every failure mapped to `false`.
pub(crate) async fn is_healthy<F>(fetch: F) -> bool
where
    F: FnOnce() -> KafkaResult<Metadata> + Send + 'static,
{
    match fetch_broker_count(fetch).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Health check failed: {e}");
            false
        }
    }
}
