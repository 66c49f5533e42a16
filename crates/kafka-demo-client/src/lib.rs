//! # Kafka demo client
//!
//! Exercises the credentials the integrator hands out: a producer that
//! republishes new Hacker News stories onto the granted topic, and a consumer
//! that logs them back until the topic goes quiet.

pub mod args;
pub mod consumer;
pub mod error;
pub mod feed;
pub mod producer;
pub mod settings;

pub use args::{ClientArgs, Mode};
pub use consumer::{consume_until_idle, KafkaSource, MessageSource, IDLE_TIMEOUT};
pub use error::{ClientError, ClientResult};
pub use feed::{FeedItem, FeedSource, HackerNewsFeed, HN_API_BASE};
pub use producer::{KafkaSink, MessageSink, StoryProducer, ACK_TIMEOUT, PACING};
pub use settings::{consumer_group, ConnectionSettings, SASL_MECHANISM};
