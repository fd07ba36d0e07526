//! Broker capability trait

use super::{PublishError, RecordBatch};
use async_trait::async_trait;

/// Message broker capability used by the publisher
///
/// Implementations must tolerate concurrent use from many crawl tasks.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Publishes one unkeyed record and waits for the broker's acknowledgement
    async fn send_and_wait(
        &self,
        topic: &str,
        payload: &[u8],
        timestamp_ms: i64,
    ) -> Result<(), PublishError>;

    /// Partition ids of `topic`
    async fn partitions_for(&self, topic: &str) -> Result<Vec<i32>, PublishError>;

    /// Starts an empty batch sized for this broker
    fn create_batch(&self) -> RecordBatch;

    /// Sends every record of `batch` to one partition and waits for all acknowledgements
    async fn send_batch(
        &self,
        batch: RecordBatch,
        topic: &str,
        partition: i32,
    ) -> Result<(), PublishError>;
}
