//! Producer: republish new stories onto the topic.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use tracing::{info, warn};

use crate::error::ClientResult;
use crate::feed::FeedSource;
use crate::settings::ConnectionSettings;

/// Delivery acknowledgment wait per message.
pub const ACK_TIMEOUT: Duration = Duration::from_secs(60);

/// Pause between items and after an empty poll.
pub const PACING: Duration = Duration::from_secs(5);

/// Destination for published messages.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Publish and wait for the broker's acknowledgment.
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> ClientResult<()>;
}

pub struct KafkaSink {
    producer: FutureProducer,
    ack_timeout: Duration,
}

impl KafkaSink {
    pub fn new(settings: &ConnectionSettings, ack_timeout: Duration) -> ClientResult<Self> {
        let producer: FutureProducer = settings.producer_config(ack_timeout).create()?;
        Ok(Self {
            producer,
            ack_timeout,
        })
    }
}

#[async_trait]
impl MessageSink for KafkaSink {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> ClientResult<()> {
        let record = FutureRecord::to(topic).key(key).payload(payload);
        self.producer
            .send(record, Timeout::After(self.ack_timeout))
            .await
            .map_err(|(err, _)| err)?;
        Ok(())
    }
}

/// Polls the feed and publishes every item that carries an id.
pub struct StoryProducer<F, S> {
    feed: F,
    sink: S,
    topic: String,
    pacing: Duration,
}

impl<F: FeedSource, S: MessageSink> StoryProducer<F, S> {
    pub fn new(feed: F, sink: S, topic: impl Into<String>) -> Self {
        Self {
            feed,
            sink,
            topic: topic.into(),
            pacing: PACING,
        }
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// One pass over the newest stories. Returns how many were published.
    ///
    /// Feed failures are logged and skipped; a failed publish ends the pass
    /// with an error.
    pub async fn publish_round(&self) -> ClientResult<usize> {
        info!("requesting new stories");
        let ids = match self.feed.new_story_ids().await {
            Ok(ids) if !ids.is_empty() => ids,
            Ok(_) => {
                warn!("no new stories returned");
                tokio::time::sleep(self.pacing).await;
                return Ok(0);
            }
            Err(err) => {
                warn!(error = %err, "failed retrieving new stories");
                tokio::time::sleep(self.pacing).await;
                return Ok(0);
            }
        };
        info!(count = ids.len(), "retrieved new stories");

        let mut published = 0;
        for content_id in ids {
            match self.feed.item(content_id).await {
                Ok(item) => match item.id {
                    Some(item_id) => {
                        self.sink
                            .publish(&self.topic, &item_id.to_string(), &item.raw)
                            .await?;
                        published += 1;
                        info!(
                            topic = %self.topic,
                            item_id,
                            title = item.title.as_deref().unwrap_or_default(),
                            url = item.url.as_deref().unwrap_or_default(),
                            "message published"
                        );
                    }
                    None => warn!(content_id, "missing item id"),
                },
                Err(err) => warn!(content_id, error = %err, "failed fetching item"),
            }
            tokio::time::sleep(self.pacing).await;
        }
        Ok(published)
    }

    /// Publish forever; returns only on a publish failure.
    pub async fn run(&self) -> ClientResult<()> {
        loop {
            self.publish_round().await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::feed::FeedItem;
    use rdkafka::error::KafkaError;
    use rdkafka::types::RDKafkaErrorCode;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StaticFeed {
        ids: Vec<u64>,
        items: HashMap<u64, &'static str>,
    }

    #[async_trait]
    impl FeedSource for StaticFeed {
        async fn new_story_ids(&self) -> ClientResult<Vec<u64>> {
            Ok(self.ids.clone())
        }

        async fn item(&self, id: u64) -> ClientResult<FeedItem> {
            let body = self.items.get(&id).copied().unwrap_or("null");
            FeedItem::from_bytes(body.as_bytes().to_vec())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(String, String, Vec<u8>)>>,
        fail: bool,
    }

    #[async_trait]
    impl MessageSink for RecordingSink {
        async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> ClientResult<()> {
            if self.fail {
                return Err(ClientError::Kafka(KafkaError::MessageProduction(
                    RDKafkaErrorCode::MessageTimedOut,
                )));
            }
            self.sent
                .lock()
                .unwrap()
                .push((topic.to_string(), key.to_string(), payload.to_vec()));
            Ok(())
        }
    }

    fn feed() -> StaticFeed {
        StaticFeed {
            ids: vec![1, 2, 3],
            items: HashMap::from([
                (1, r#"{"id":1,"title":"one"}"#),
                (3, r#"{"id":3,"url":"http://three.test"}"#),
            ]),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_publishes_items_with_ids_keyed_by_id() {
        let producer = StoryProducer::new(feed(), RecordingSink::default(), "demo");

        let start = tokio::time::Instant::now();
        let published = producer.publish_round().await.unwrap();
        assert_eq!(published, 2);
        assert_eq!(start.elapsed(), PACING * 3);

        let sent = producer.sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "demo");
        assert_eq!(sent[0].1, "1");
        assert_eq!(sent[0].2, br#"{"id":1,"title":"one"}"#.to_vec());
        assert_eq!(sent[1].1, "3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_poll_waits_and_publishes_nothing() {
        let empty = StaticFeed {
            ids: Vec::new(),
            items: HashMap::new(),
        };
        let producer = StoryProducer::new(empty, RecordingSink::default(), "demo");

        let start = tokio::time::Instant::now();
        assert_eq!(producer.publish_round().await.unwrap(), 0);
        assert_eq!(start.elapsed(), PACING);
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_failure_ends_round() {
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let producer =
            StoryProducer::new(feed(), sink, "demo").with_pacing(Duration::from_millis(10));

        let err = producer.publish_round().await.unwrap_err();
        assert!(matches!(err, ClientError::Kafka(_)));
    }
}
