//! Consumer lifecycle E2E tests: liveness, cancellation and handler failures.

use crate::common::{
    init_tracing, recv, testing_message, RunningConsumer, SentTestingMessage, TestNames,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use typed_kafka::{
    Consumer, ConsumerState, Error, HandlerErrorPolicy, MessageContext, Producer, ProducerConfig,
};

#[tokio::test]
#[ignore = "requires a running Kafka broker"]
async fn test_health_check_against_reachable_and_unreachable_brokers() -> anyhow::Result<()> {
    init_tracing();
    let names = TestNames::create("health").await?;

    let producer = Producer::connect(names.producer_config()).await?;
    assert!(producer.health_check().await);

    let consumer = Consumer::connect(names.consumer_config()).await?;
    assert!(consumer.health_check().await);

    let mut unreachable = ProducerConfig::new(vec!["127.0.0.1:1".to_string()]);
    unreachable.verify_connection = false;
    unreachable.metadata_timeout = Duration::from_millis(500);
    let producer = Producer::connect(unreachable).await?;
    assert!(!producer.health_check().await);

    names.cleanup().await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Kafka broker"]
async fn test_cancellation_stops_consumer_cleanly() -> anyhow::Result<()> {
    init_tracing();
    let names = TestNames::create("cancel").await?;

    let consumer = Consumer::connect(names.consumer_config()).await?;
    assert_eq!(consumer.state(), ConsumerState::Created);

    let running = RunningConsumer::spawn(consumer);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(running.consumer.state(), ConsumerState::Consuming);

    let (consumer, result) = running.stop().await?;
    result?;
    assert_eq!(consumer.state(), ConsumerState::Stopped);

    // A stopped consumer cannot be restarted
    let err = consumer
        .start(CancellationToken::new())
        .await
        .expect_err("restart should fail");
    assert!(matches!(err, Error::InvalidState(ConsumerState::Stopped)));

    names.cleanup().await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Kafka broker"]
async fn test_processed_offsets_are_committed_on_shutdown() -> anyhow::Result<()> {
    init_tracing();
    let names = TestNames::create("commit").await?;

    let producer = Producer::connect(names.producer_config()).await?;
    producer.send(&names.topic, "first", &testing_message()).await?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let forward = move |context: MessageContext, _message: SentTestingMessage| {
        let tx = tx.clone();
        async move {
            tx.send(context.key().map(<[u8]>::to_vec))?;
            Ok::<_, anyhow::Error>(())
        }
    };

    let mut consumer = Consumer::connect(names.consumer_config()).await?;
    consumer.add_handler_for(forward.clone());
    let running = RunningConsumer::spawn(consumer);
    assert_eq!(recv(&mut rx).await?.as_deref(), Some(b"first".as_slice()));
    let (_, result) = running.stop().await?;
    result?;

    // Same group: only the record published after the commit is delivered
    producer.send(&names.topic, "second", &testing_message()).await?;

    let mut consumer = Consumer::connect(names.consumer_config()).await?;
    consumer.add_handler_for(forward);
    let running = RunningConsumer::spawn(consumer);
    assert_eq!(recv(&mut rx).await?.as_deref(), Some(b"second".as_slice()));
    let (_, result) = running.stop().await?;
    result?;

    names.cleanup().await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Kafka broker"]
async fn test_stop_policy_returns_handler_error() -> anyhow::Result<()> {
    init_tracing();
    let names = TestNames::create("stop-policy").await?;

    let producer = Producer::connect(names.producer_config()).await?;
    producer
        .send(&names.topic, "testing-message-id", &testing_message())
        .await?;

    let mut config = names.consumer_config();
    config.on_handler_error = HandlerErrorPolicy::Stop;
    let mut consumer = Consumer::connect(config).await?;
    consumer.add_handler_for(|_context: MessageContext, message: SentTestingMessage| async move {
        Err::<(), _>(anyhow::anyhow!("rejected {}", message.id))
    });

    let consumer = std::sync::Arc::new(consumer);
    let result = tokio::time::timeout(
        crate::common::RECEIVE_TIMEOUT,
        consumer.start(CancellationToken::new()),
    )
    .await?;

    match result {
        Err(Error::Handler {
            message_type,
            source,
        }) => {
            assert_eq!(message_type, "SentTestingMessage");
            assert_eq!(source.to_string(), "rejected testing-message-id");
        }
        other => panic!("expected a handler error, got {other:?}"),
    }
    assert_eq!(consumer.state(), ConsumerState::Stopped);

    names.cleanup().await?;
    Ok(())
}
