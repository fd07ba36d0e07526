//! In-process broker that records everything it is sent
//!
//! A test double: it stands in for Kafka in unit and integration tests so they can
//! assert on published records. The binary always publishes through `KafkaBroker`.

use super::{BatchRecord, Broker, PublishError, RecordBatch};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A record sent through `send_and_wait`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRecord {
    pub topic: String,
    pub payload: Vec<u8>,
    pub timestamp_ms: i64,
}

/// A batch sent through `send_batch`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentBatch {
    pub topic: String,
    pub partition: i32,
    pub records: Vec<BatchRecord>,
}

#[derive(Default)]
struct Sent {
    records: Vec<SentRecord>,
    batches: Vec<SentBatch>,
}

pub struct MemoryBroker {
    topics: HashMap<String, Vec<i32>>,
    max_batch_bytes: usize,
    failing: AtomicBool,
    sent: Mutex<Sent>,
}

impl MemoryBroker {
    pub fn new(max_batch_bytes: usize) -> Self {
        Self {
            topics: HashMap::new(),
            max_batch_bytes,
            failing: AtomicBool::new(false),
            sent: Mutex::new(Sent::default()),
        }
    }

    /// Declares `topic` with partitions `0..partitions`
    pub fn with_topic(mut self, topic: &str, partitions: i32) -> Self {
        self.topics
            .insert(topic.to_string(), (0..partitions).collect());
        self
    }

    /// Makes every subsequent send fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<SentRecord> {
        self.sent().records.clone()
    }

    pub fn batches(&self) -> Vec<SentBatch> {
        self.sent().batches.clone()
    }

    fn sent(&self) -> MutexGuard<'_, Sent> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_failing(&self, topic: &str) -> Result<(), PublishError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PublishError::Canceled {
                topic: topic.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn send_and_wait(
        &self,
        topic: &str,
        payload: &[u8],
        timestamp_ms: i64,
    ) -> Result<(), PublishError> {
        self.check_failing(topic)?;
        self.sent().records.push(SentRecord {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            timestamp_ms,
        });
        Ok(())
    }

    async fn partitions_for(&self, topic: &str) -> Result<Vec<i32>, PublishError> {
        Ok(self.topics.get(topic).cloned().unwrap_or_default())
    }

    fn create_batch(&self) -> RecordBatch {
        RecordBatch::new(self.max_batch_bytes)
    }

    async fn send_batch(
        &self,
        batch: RecordBatch,
        topic: &str,
        partition: i32,
    ) -> Result<(), PublishError> {
        self.check_failing(topic)?;
        self.sent().batches.push(SentBatch {
            topic: topic.to_string(),
            partition,
            records: batch.into_records(),
        });
        Ok(())
    }
}
