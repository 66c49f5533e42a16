//! Consumer: log every payload until the topic goes quiet.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::Message;
use tracing::info;

use crate::error::ClientResult;
use crate::settings::ConnectionSettings;

/// Stop after this long without a message.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(15);

/// Source of message payloads.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Wait for the next message; `None` payload for tombstones.
    async fn next_payload(&self) -> ClientResult<Option<Vec<u8>>>;
}

pub struct KafkaSource {
    consumer: StreamConsumer,
}

impl KafkaSource {
    /// Subscribe to `topic` as group `<group_prefix>1`.
    pub fn subscribe(
        settings: &ConnectionSettings,
        topic: &str,
        group_prefix: &str,
    ) -> ClientResult<Self> {
        let consumer: StreamConsumer = settings.consumer_config(group_prefix).create()?;
        consumer.subscribe(&[topic])?;
        Ok(Self { consumer })
    }
}

#[async_trait]
impl MessageSource for KafkaSource {
    async fn next_payload(&self) -> ClientResult<Option<Vec<u8>>> {
        let message = self.consumer.recv().await?;
        Ok(message.payload().map(<[u8]>::to_vec))
    }
}

/// Log payloads until `idle` passes without one. Returns the message count.
pub async fn consume_until_idle<S: MessageSource>(
    source: &S,
    idle: Duration,
) -> ClientResult<usize> {
    let mut received = 0;
    loop {
        match tokio::time::timeout(idle, source.next_payload()).await {
            Err(_) => {
                info!(received, idle_secs = idle.as_secs(), "no messages, stopping consumer");
                return Ok(received);
            }
            Ok(payload) => {
                let payload = payload?;
                received += 1;
                match payload {
                    Some(bytes) => {
                        info!(payload = %String::from_utf8_lossy(&bytes), "message received")
                    }
                    None => info!("message received without payload"),
                }
            }
        }
    }
}
