//! Demo client errors

use rdkafka::error::KafkaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("kafka error: {0}")]
    Kafka(#[from] KafkaError),

    #[error("feed request failed: {0}")]
    Feed(#[from] reqwest::Error),

    #[error("malformed feed payload: {0}")]
    Payload(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
