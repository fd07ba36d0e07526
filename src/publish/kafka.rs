//! Kafka broker backed by rdkafka's `FutureProducer`

use super::{retry_fixed, Broker, PublishError, RecordBatch};
use crate::config::BrokerConfig;
use async_trait::async_trait;
use futures::future::join_all;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use std::time::Duration;

/// Owned snapshot of cluster metadata
struct ClusterView {
    brokers: usize,
    topics: Vec<TopicView>,
}

struct TopicView {
    name: String,
    error: Option<String>,
    partitions: Vec<i32>,
}

impl ClusterView {
    fn from_metadata(metadata: &rdkafka::metadata::Metadata) -> Self {
        Self {
            brokers: metadata.brokers().len(),
            topics: metadata
                .topics()
                .iter()
                .map(|t| TopicView {
                    name: t.name().to_string(),
                    error: t.error().map(|e| format!("{:?}", e)),
                    partitions: t.partitions().iter().map(|p| p.id()).collect(),
                })
                .collect(),
        }
    }
}

pub struct KafkaBroker {
    producer: FutureProducer,
    max_batch_bytes: usize,
    send_timeout: Duration,
}

impl KafkaBroker {
    /// Creates the producer; no connection is made until the first request
    pub fn new(config: &BrokerConfig) -> Result<Self, PublishError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("message.timeout.ms", config.send_timeout_ms.to_string())
            .set("batch.size", config.max_batch_bytes.to_string())
            .create()?;

        Ok(Self {
            producer,
            max_batch_bytes: config.max_batch_bytes,
            send_timeout: config.send_timeout(),
        })
    }

    /// Creates the producer and verifies the cluster answers a metadata request,
    /// retrying with a fixed delay
    ///
    /// Returns the last error once `connect_attempts` attempts have failed.
    pub async fn connect_with_retry(config: &BrokerConfig) -> Result<Self, PublishError> {
        let broker = Self::new(config)?;

        let cluster = retry_fixed(
            config.connect_attempts,
            config.connect_retry_delay(),
            |attempt| {
                tracing::debug!(
                    "Connecting to Kafka at {} (attempt {})",
                    config.bootstrap_servers,
                    attempt
                );
                broker.fetch_metadata(None)
            },
        )
        .await?;

        tracing::info!(
            "Connected to Kafka at {} ({} broker(s))",
            config.bootstrap_servers,
            cluster.brokers
        );
        Ok(broker)
    }

    /// Waits for every queued message to be delivered
    ///
    /// librdkafka blocks while flushing, so this runs on the blocking pool.
    pub async fn flush(&self) -> Result<(), PublishError> {
        let producer = self.producer.clone();
        let timeout = self.send_timeout;

        tokio::task::spawn_blocking(move || producer.flush(timeout))
            .await??;
        Ok(())
    }

    async fn fetch_metadata(&self, topic: Option<&str>) -> Result<ClusterView, PublishError> {
        let producer = self.producer.clone();
        let owned_topic = topic.map(str::to_string);
        let timeout = self.send_timeout;

        tokio::task::spawn_blocking(move || {
            producer
                .client()
                .fetch_metadata(owned_topic.as_deref(), timeout)
                .map(|metadata| ClusterView::from_metadata(&metadata))
        })
        .await
        .map_err(|e| PublishError::Metadata {
            topic: topic.unwrap_or("*").to_string(),
            message: e.to_string(),
        })?
        .map_err(PublishError::from)
    }
}

#[async_trait]
impl Broker for KafkaBroker {
    async fn send_and_wait(
        &self,
        topic: &str,
        payload: &[u8],
        timestamp_ms: i64,
    ) -> Result<(), PublishError> {
        let record = FutureRecord::<(), [u8]>::to(topic)
            .payload(payload)
            .timestamp(timestamp_ms);

        self.producer
            .send(record, self.send_timeout)
            .await
            .map_err(|(e, _)| PublishError::Kafka(e))?;
        Ok(())
    }

    async fn partitions_for(&self, topic: &str) -> Result<Vec<i32>, PublishError> {
        let cluster = self.fetch_metadata(Some(topic)).await?;
        let Some(entry) = cluster.topics.into_iter().find(|t| t.name == topic) else {
            return Err(PublishError::NoPartitions {
                topic: topic.to_string(),
            });
        };

        if let Some(message) = entry.error {
            return Err(PublishError::Metadata {
                topic: topic.to_string(),
                message,
            });
        }

        Ok(entry.partitions)
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
        let mut deliveries = Vec::with_capacity(batch.len());

        for record in batch.records() {
            let future_record = FutureRecord::<(), [u8]>::to(topic)
                .payload(record.value.as_slice())
                .partition(partition)
                .timestamp(record.timestamp_ms);

            let delivery = self
                .producer
                .send_result(future_record)
                .map_err(|(e, _)| PublishError::Kafka(e))?;
            deliveries.push(delivery);
        }

        for result in join_all(deliveries).await {
            result
                .map_err(|_| PublishError::Canceled {
                    topic: topic.to_string(),
                })?
                .map_err(|(e, _)| PublishError::Kafka(e))?;
        }

        tracing::debug!(
            "Sent batch of {} record(s) to {}[{}]",
            batch.len(),
            topic,
            partition
        );
        Ok(())
    }
}
