use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use typed_kafka_client::{
    kafka_message, Consumer, ConsumerConfig, MessageContext, Producer, ProducerConfig,
};

/// Example demonstrating typed handlers on a consumer
///
/// This example shows how to:
/// 1. Declare message types with the default JSON codec
/// 2. Publish typed messages with a producer
/// 3. Register one handler per message type plus a fallback
/// 4. Stop the consumer with a cancellation token on Ctrl+C
///
/// To run this example:
/// 1. Start Kafka with Docker
///   docker run -d --name kafka -p 9092:9092 apache/kafka:latest
/// 2. Run the example
///   cargo run -p typed-kafka-client --example typed_handlers

#[derive(Debug, Serialize, Deserialize)]
struct UserSignedUp {
    user_id: String,
    email: String,
}

kafka_message!(UserSignedUp);

#[derive(Debug, Serialize, Deserialize)]
struct UserDeleted {
    user_id: String,
}

kafka_message!(UserDeleted, name = "user.deleted.v1");

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    match run_main().await {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {e:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<()> {
    let brokers = vec!["localhost:9092".to_string()];
    let topic = "user-events";

    let producer = Producer::connect(ProducerConfig::new(brokers.clone())).await?;
    producer
        .send(
            topic,
            "user-1",
            &UserSignedUp {
                user_id: "user-1".to_string(),
                email: "user-1@example.com".to_string(),
            },
        )
        .await?;
    producer
        .send(
            topic,
            "user-1",
            &UserDeleted {
                user_id: "user-1".to_string(),
            },
        )
        .await?;
    producer
        .send_raw(topic, "user-2", b"legacy payload", None)
        .await?;

    println!("Published 3 records to {topic}");

    let config = ConsumerConfig::new(brokers, "typed-handlers-example", vec![topic.to_string()]);
    let mut consumer = Consumer::connect(config).await?;

    // Shared counter for processed messages
    let processed_count = Arc::new(AtomicU64::new(0));

    consumer
        .add_handler_for({
            let counter = Arc::clone(&processed_count);
            move |context: MessageContext, event: UserSignedUp| {
                let counter = Arc::clone(&counter);
                async move {
                    println!(
                        "[{:?}] {} signed up with {}",
                        context.topic(),
                        event.user_id,
                        event.email
                    );
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, anyhow::Error>(())
                }
            }
        })
        .add_handler_for({
            let counter = Arc::clone(&processed_count);
            move |_context: MessageContext, event: UserDeleted| {
                let counter = Arc::clone(&counter);
                async move {
                    println!("{} deleted", event.user_id);
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, anyhow::Error>(())
                }
            }
        })
        .add_fallback(|context: MessageContext, payload: Vec<u8>| async move {
            println!(
                "Unhandled {:?} record at offset {:?}: {} bytes",
                context.message_type(),
                context.offset(),
                payload.len()
            );
            Ok::<_, anyhow::Error>(())
        });

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        }
    });

    println!("Consumer running. Press Ctrl+C to stop.");
    consumer.start(shutdown).await?;

    println!(
        "Processed {} typed messages",
        processed_count.load(Ordering::SeqCst)
    );
    Ok(())
}
