//! Link fan-out across a topic's partitions, plus the per-page summary

use super::{Broker, PublishError, RecordBatch};
use std::sync::Arc;

/// Where each link batch went
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// `(partition, record count)` per sent batch, in send order
    pub batches: Vec<(i32, usize)>,
}

impl PublishReport {
    pub fn records(&self) -> usize {
        self.batches.iter().map(|(_, count)| count).sum()
    }
}

/// Publishes page summaries and discovered links
///
/// Batch-building state is local to each call, so one publisher can be shared by
/// every crawl task; only the broker handle is shared.
pub struct PartitionPublisher {
    broker: Arc<dyn Broker>,
    urls_topic: String,
    summary_topic: String,
}

impl PartitionPublisher {
    pub fn new(
        broker: Arc<dyn Broker>,
        urls_topic: impl Into<String>,
        summary_topic: impl Into<String>,
    ) -> Self {
        Self {
            broker,
            urls_topic: urls_topic.into(),
            summary_topic: summary_topic.into(),
        }
    }

    pub fn urls_topic(&self) -> &str {
        &self.urls_topic
    }

    pub fn summary_topic(&self) -> &str {
        &self.summary_topic
    }

    /// Sends one record and waits for the acknowledgement
    pub async fn send_record(
        &self,
        topic: &str,
        payload: &[u8],
        timestamp_ms: i64,
    ) -> Result<(), PublishError> {
        self.broker.send_and_wait(topic, payload, timestamp_ms).await
    }

    /// Sends the `[url, [links...]]` summary of a crawled page
    pub async fn publish_summary(
        &self,
        url: &str,
        links: &[String],
        timestamp_ms: i64,
    ) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(&(url, links))?;
        self.send_record(&self.summary_topic, &payload, timestamp_ms)
            .await
    }

    /// Sends every link to the links topic, one batch per partition in round-robin
    /// order, all sharing `timestamp_ms`
    ///
    /// A link that does not fit in the current batch starts the next one. Every
    /// link lands in exactly one sent batch.
    pub async fn publish_discovered_links(
        &self,
        links: &[String],
        timestamp_ms: i64,
    ) -> Result<PublishReport, PublishError> {
        let mut report = PublishReport::default();
        if links.is_empty() {
            return Ok(report);
        }

        let partitions = self.broker.partitions_for(&self.urls_topic).await?;
        if partitions.is_empty() {
            return Err(PublishError::NoPartitions {
                topic: self.urls_topic.clone(),
            });
        }

        let mut counter = 0usize;
        let mut batch = self.broker.create_batch();

        for link in links {
            let mut pending = Some(link.as_bytes().to_vec());
            while let Some(value) = pending.take() {
                if let Err(rejected) = batch.try_append(value, timestamp_ms) {
                    let full = std::mem::replace(&mut batch, self.broker.create_batch());
                    let partition = partitions[counter % partitions.len()];
                    self.flush(full, partition, &mut report).await?;
                    counter += 1;
                    pending = Some(rejected);
                }
            }
        }

        if !batch.is_empty() {
            let partition = partitions[counter % partitions.len()];
            self.flush(batch, partition, &mut report).await?;
        }

        tracing::debug!(
            "Published {} link(s) to '{}' in {} batch(es)",
            report.records(),
            self.urls_topic,
            report.batches.len()
        );
        Ok(report)
    }

    async fn flush(
        &self,
        batch: RecordBatch,
        partition: i32,
        report: &mut PublishReport,
    ) -> Result<(), PublishError> {
        let count = batch.len();
        self.broker
            .send_batch(batch, &self.urls_topic, partition)
            .await?;
        report.batches.push((partition, count));
        Ok(())
    }
}
