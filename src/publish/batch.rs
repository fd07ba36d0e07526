//! Append-only record batches bounded by an encoded-size limit

/// Fixed bytes of a record batch header (Kafka record batch v2)
pub const BATCH_HEADER_BYTES: usize = 61;

/// Upper estimate of the per-record framing around the value (length, attributes,
/// timestamp and offset deltas, null key, header count)
pub const RECORD_OVERHEAD_BYTES: usize = 21;

/// One unkeyed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRecord {
    pub value: Vec<u8>,
    pub timestamp_ms: i64,
}

/// Records bound for one partition
///
/// Appending fails once the estimated encoded size would exceed `max_bytes`. An empty
/// batch always accepts its first record, so every record fits in some batch.
#[derive(Debug, Clone)]
pub struct RecordBatch {
    records: Vec<BatchRecord>,
    size: usize,
    max_bytes: usize,
}

impl RecordBatch {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            records: Vec::new(),
            size: BATCH_HEADER_BYTES,
            max_bytes,
        }
    }

    /// Estimated encoded size of a record holding `value_len` bytes
    pub fn record_size(value_len: usize) -> usize {
        RECORD_OVERHEAD_BYTES + value_len
    }

    /// Appends a record, handing the value back if the batch is full
    pub fn try_append(&mut self, value: Vec<u8>, timestamp_ms: i64) -> Result<(), Vec<u8>> {
        let record_size = Self::record_size(value.len());
        if !self.records.is_empty() && self.size + record_size > self.max_bytes {
            return Err(value);
        }

        self.size += record_size;
        self.records.push(BatchRecord {
            value,
            timestamp_ms,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Estimated encoded size so far
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn records(&self) -> &[BatchRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<BatchRecord> {
        self.records
    }
}
