use std::mem;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::DEFAULT_BATCH_SIZE;
use crate::error::PktfeedError;

/// Serialized feature records waiting for the next flush.
///
/// Appends and drains are serialized by one mutex. A drain swaps the whole
/// vector out, so every record is handed to exactly one flush.
#[derive(Debug)]
pub struct BatchBuffer {
    records: Mutex<Vec<String>>,
    threshold: usize,
}

impl Default for BatchBuffer {
    fn default() -> Self {
        BatchBuffer::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchBuffer {
    pub fn new(threshold: usize) -> BatchBuffer {
        BatchBuffer {
            records: Mutex::new(Vec::new()),
            threshold: threshold.max(1),
        }
    }
    fn lock(&self) -> Result<MutexGuard<'_, Vec<String>>, PktfeedError> {
        self.records.lock().map_err(|_| PktfeedError::UnlockError {
            name: String::from("BatchBuffer"),
        })
    }
    pub fn threshold(&self) -> usize {
        self.threshold
    }
    /// Append a record, returns true once the buffer holds `threshold` records.
    pub fn append(&self, record: String) -> Result<bool, PktfeedError> {
        let mut records = self.lock()?;
        records.push(record);
        Ok(records.len() >= self.threshold)
    }
    /// Take every buffered record in insertion order and leave the buffer empty.
    pub fn drain_all(&self) -> Result<Vec<String>, PktfeedError> {
        let mut records = self.lock()?;
        Ok(mem::take(&mut *records))
    }
    pub fn len(&self) -> Result<usize, PktfeedError> {
        Ok(self.lock()?.len())
    }
    pub fn is_empty(&self) -> Result<bool, PktfeedError> {
        Ok(self.lock()?.is_empty())
    }
}
