//! kafka-client - demo producer/consumer

use anyhow::Context;
use clap::Parser;
use kafka_demo_client::{
    consume_until_idle, ClientArgs, HackerNewsFeed, KafkaSink, KafkaSource, Mode, StoryProducer,
    ACK_TIMEOUT, HN_API_BASE, IDLE_TIMEOUT,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ClientArgs::parse();

    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    if args.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let settings = args.settings();
    info!(
        servers = %settings.servers.join(","),
        topic = %args.topic,
        protocol = %settings.security_protocol,
        mode = ?args.mode(),
        "starting kafka client"
    );

    match args.mode() {
        Mode::Producer => {
            let feed = HackerNewsFeed::new(HN_API_BASE).context("building feed client")?;
            let sink = KafkaSink::new(&settings, ACK_TIMEOUT).context("creating producer")?;
            StoryProducer::new(feed, sink, args.topic.clone())
                .run()
                .await
                .context("publishing stories")?;
        }
        Mode::Consumer => {
            let source = KafkaSource::subscribe(&settings, &args.topic, &args.consumer_group_prefix)
                .context("creating consumer")?;
            let received = consume_until_idle(&source, IDLE_TIMEOUT)
                .await
                .context("consuming messages")?;
            info!(received, "consumer finished");
        }
    }

    Ok(())
}
