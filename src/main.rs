//! Command-line interface for typed-kafka
//!
//! # Usage Examples
//!
//! ## Produce
//! ```bash
//! # Tagged JSON payload, routed to the OrderPlaced handler by consumers
//! typed-kafka produce \
//!   --brokers localhost:9092 \
//!   --topic orders --key order-1 \
//!   --message-type OrderPlaced \
//!   --payload '{"id":"order-1","amount":42}'
//!
//! # Untagged payload read from a file, delivered to the fallback
//! typed-kafka produce --topic orders --key order-2 --payload @order.json
//! ```
//!
//! ## Consume
//! ```bash
//! # Log every record until Ctrl+C
//! typed-kafka consume \
//!   --brokers localhost:9092 \
//!   --group-id inspector \
//!   --topics orders,payments
//! ```
//!
//! Brokers and group ID can also be given with `KAFKA_BROKERS` and `KAFKA_GROUP_ID`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use typed_kafka::{Consumer, ConsumerConfig, HandlerErrorPolicy, Producer, ProducerConfig};

#[derive(Parser)]
#[command(name = "typed-kafka")]
#[command(about = "Produce and consume typed Kafka messages")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish one payload, optionally tagged with a message type
    Produce {
        /// Kafka broker addresses (comma-separated)
        #[arg(
            long,
            env = "KAFKA_BROKERS",
            value_delimiter = ',',
            default_value = "localhost:9092"
        )]
        brokers: Vec<String>,

        /// Topic to publish to
        #[arg(long)]
        topic: String,

        /// Record key
        #[arg(long)]
        key: String,

        /// Type identifier written to the `@type` header
        #[arg(long)]
        message_type: Option<String>,

        /// Payload, or `@path` to read it from a file
        #[arg(long)]
        payload: String,
    },
    /// Consume topics and log every record until Ctrl+C
    Consume {
        /// Kafka broker addresses (comma-separated)
        #[arg(
            long,
            env = "KAFKA_BROKERS",
            value_delimiter = ',',
            default_value = "localhost:9092"
        )]
        brokers: Vec<String>,

        /// Consumer group ID
        #[arg(long, env = "KAFKA_GROUP_ID")]
        group_id: String,

        /// Topics to subscribe to (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        topics: Vec<String>,

        /// What to do when a handler fails: continue or stop
        #[arg(long, default_value = "continue")]
        on_handler_error: HandlerErrorPolicy,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("typed_kafka=info,typed_kafka_client=info")
            }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Produce {
            brokers,
            topic,
            key,
            message_type,
            payload,
        } => run_produce(brokers, topic, key, message_type, payload).await?,
        Commands::Consume {
            brokers,
            group_id,
            topics,
            on_handler_error,
        } => run_consume(brokers, group_id, topics, on_handler_error).await?,
    }

    Ok(())
}

async fn run_produce(
    brokers: Vec<String>,
    topic: String,
    key: String,
    message_type: Option<String>,
    payload: String,
) -> anyhow::Result<()> {
    let payload = read_payload(&payload)?;

    let producer = Producer::connect(ProducerConfig::new(brokers))
        .await
        .context("Failed to connect producer")?;
    producer
        .send_raw(&topic, &key, &payload, message_type.as_deref())
        .await
        .with_context(|| format!("Failed to publish to topic '{topic}'"))?;

    info!(
        "Published {} bytes to '{topic}' as {}",
        payload.len(),
        message_type.as_deref().unwrap_or("untagged")
    );
    Ok(())
}

async fn run_consume(
    brokers: Vec<String>,
    group_id: String,
    topics: Vec<String>,
    on_handler_error: HandlerErrorPolicy,
) -> anyhow::Result<()> {
    let mut config = ConsumerConfig::new(brokers, group_id, topics);
    config.on_handler_error = on_handler_error;

    let mut consumer = Consumer::connect(config)
        .await
        .context("Failed to connect consumer")?;
    consumer.add_fallback(|context, payload| async move {
        info!(
            topic = context.topic().unwrap_or_default(),
            partition = context.partition().unwrap_or_default(),
            offset = context.offset().unwrap_or_default(),
            message_type = context.message_type().unwrap_or_default(),
            "{}",
            String::from_utf8_lossy(&payload)
        );
        Ok::<_, anyhow::Error>(())
    });

    let shutdown = setup_shutdown_handler();
    consumer.start(shutdown).await?;
    Ok(())
}

/// Payload bytes from the argument itself, or from a file when it starts with `@`.
fn read_payload(arg: &str) -> anyhow::Result<Vec<u8>> {
    match arg.strip_prefix('@') {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("Failed to read payload from {path}"))
        }
        None => Ok(arg.as_bytes().to_vec()),
    }
}

/// Sets up a shutdown signal handler
fn setup_shutdown_handler() -> CancellationToken {
    let shutdown = CancellationToken::new();

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received interrupt signal (Ctrl+C)");
                    shutdown.cancel();
                }
                Err(e) => error!("Failed to install CTRL+C signal handler: {e}"),
            }
        }
    });

    shutdown
}
