//! Publish module
//!
//! This module fans crawl results out to the message broker:
//! - The per-page summary, sent as a single acknowledged record
//! - Discovered links, batched and spread round-robin across the topic's partitions

mod batch;
mod broker;
mod kafka;
mod memory;
mod publisher;
mod retry;

pub use batch::{BatchRecord, RecordBatch, BATCH_HEADER_BYTES, RECORD_OVERHEAD_BYTES};
pub use broker::Broker;
pub use kafka::KafkaBroker;
pub use memory::{MemoryBroker, SentBatch, SentRecord};
pub use publisher::{PartitionPublisher, PublishReport};
pub use retry::retry_fixed;

use rdkafka::error::KafkaError;
use thiserror::Error;

/// Errors raised while publishing to the broker
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Kafka error: {0}")]
    Kafka(#[from] KafkaError),

    #[error("Topic '{topic}' has no partitions")]
    NoPartitions { topic: String },

    #[error("Metadata request for '{topic}' failed: {message}")]
    Metadata { topic: String, message: String },

    #[error("Delivery to '{topic}' was canceled")]
    Canceled { topic: String },

    #[error("Blocking producer call failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Failed to encode record: {0}")]
    Serialization(#[from] serde_json::Error),
}
