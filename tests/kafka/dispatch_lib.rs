//! Typed dispatch E2E tests
//!
//! Test flow:
//! 1. Create a topic unique to the test
//! 2. Publish typed, unknown and untagged records with the producer
//! 3. Consume them with a consumer whose handlers forward what they receive
//! 4. Verify what each handler saw, then cancel the consumer

use crate::common::{
    init_tracing, recv, testing_message, CustomEncodingDecodingMessage, RunningConsumer,
    SentTestingMessage, TestNames, UnregisteredMessage,
};
use tokio::sync::mpsc;
use typed_kafka::{Consumer, MessageContext, Producer};

#[tokio::test]
#[ignore = "requires a running Kafka broker"]
async fn test_typed_message_reaches_handler_with_topic() -> anyhow::Result<()> {
    init_tracing();
    let names = TestNames::create("typed").await?;

    let producer = Producer::connect(names.producer_config()).await?;
    producer
        .send(&names.topic, "testing-message-id", &testing_message())
        .await?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut consumer = Consumer::connect(names.consumer_config()).await?;
    consumer.add_handler_for(move |context: MessageContext, message: SentTestingMessage| {
        let tx = tx.clone();
        async move {
            tx.send((
                context.topic().map(str::to_string),
                context.key().map(<[u8]>::to_vec),
                message,
            ))?;
            Ok::<_, anyhow::Error>(())
        }
    });

    let running = RunningConsumer::spawn(consumer);
    let (topic, key, message) = recv(&mut rx).await?;

    assert_eq!(topic.as_deref(), Some(names.topic.as_str()));
    assert_eq!(key.as_deref(), Some(b"testing-message-id".as_slice()));
    assert_eq!(message, testing_message());

    let (_, result) = running.stop().await?;
    result?;
    names.cleanup().await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Kafka broker"]
async fn test_fallback_receives_unknown_and_untagged_records() -> anyhow::Result<()> {
    init_tracing();
    let names = TestNames::create("fallback").await?;

    let producer = Producer::connect(names.producer_config()).await?;
    producer
        .send(&names.topic, "tagged", &testing_message())
        .await?;
    producer
        .send_raw(&names.topic, "untagged", b"\x00raw bytes\xff", None)
        .await?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut consumer = Consumer::connect(names.consumer_config()).await?;
    consumer
        .add_handler_for(|_context: MessageContext, _message: UnregisteredMessage| async {
            Err::<(), _>(anyhow::anyhow!("no record of this type was published"))
        })
        .add_fallback(move |context: MessageContext, payload: Vec<u8>| {
            let tx = tx.clone();
            async move {
                tx.send((
                    context.topic().map(str::to_string),
                    context.message_type().map(str::to_string),
                    payload,
                ))?;
                Ok::<_, anyhow::Error>(())
            }
        });

    let running = RunningConsumer::spawn(consumer);

    // Single partition, so records arrive in publish order
    let (topic, message_type, payload) = recv(&mut rx).await?;
    assert_eq!(topic.as_deref(), Some(names.topic.as_str()));
    assert_eq!(message_type.as_deref(), Some("SentTestingMessage"));
    assert_eq!(payload, typed_kafka::kafka_types::encode(&testing_message())?);

    let (topic, message_type, payload) = recv(&mut rx).await?;
    assert_eq!(topic.as_deref(), Some(names.topic.as_str()));
    assert_eq!(message_type, None);
    assert_eq!(payload, b"\x00raw bytes\xff".to_vec());

    let (_, result) = running.stop().await?;
    result?;
    names.cleanup().await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Kafka broker"]
async fn test_custom_codec_roundtrip() -> anyhow::Result<()> {
    init_tracing();
    let names = TestNames::create("custom-codec").await?;

    let sent = CustomEncodingDecodingMessage {
        id: "testing-message-id".to_string(),
        name: "testing-message-name".to_string(),
    };

    let producer = Producer::connect(names.producer_config()).await?;
    producer.send(&names.topic, "custom", &sent).await?;
    // Same bytes without a type tag, to observe the wire format
    producer
        .send_raw(
            &names.topic,
            "custom",
            &typed_kafka::kafka_types::encode(&sent)?,
            None,
        )
        .await?;

    let (typed_tx, mut typed_rx) = mpsc::unbounded_channel();
    let (raw_tx, mut raw_rx) = mpsc::unbounded_channel();
    let mut consumer = Consumer::connect(names.consumer_config()).await?;
    consumer
        .add_handler_for(
            move |_context: MessageContext, message: CustomEncodingDecodingMessage| {
                let tx = typed_tx.clone();
                async move {
                    tx.send(message)?;
                    Ok::<_, anyhow::Error>(())
                }
            },
        )
        .add_fallback(move |_context: MessageContext, payload: Vec<u8>| {
            let tx = raw_tx.clone();
            async move {
                tx.send(payload)?;
                Ok::<_, anyhow::Error>(())
            }
        });

    let running = RunningConsumer::spawn(consumer);

    assert_eq!(recv(&mut typed_rx).await?, sent);
    assert_eq!(
        recv(&mut raw_rx).await?,
        b"testing-message-id;testing-message-name".to_vec()
    );

    let (_, result) = running.stop().await?;
    result?;
    names.cleanup().await?;
    Ok(())
}
