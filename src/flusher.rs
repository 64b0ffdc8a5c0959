use log::debug;
use log::warn;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::batch::BatchBuffer;
use crate::error::PktfeedError;
use crate::stats::Stats;
use crate::transport::Transport;
use crate::transport::serialize_batch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing buffered, no connection was made.
    Empty,
    Sent(usize),
    /// Delivery failed and the records are gone.
    Dropped(usize),
}

/// Drains the batch buffer and hands the payload to a transport.
///
/// Delivery is at most once: drained records are never put back.
pub struct Flusher {
    buffer: Arc<BatchBuffer>,
    transport: Box<dyn Transport>,
    stats: Arc<Stats>,
    // held across drain + send so batches reach the peer in drain order,
    // the buffer lock itself is released before any network io
    sending: Mutex<()>,
}

impl Flusher {
    pub fn new(buffer: Arc<BatchBuffer>, transport: Box<dyn Transport>, stats: Arc<Stats>) -> Flusher {
        Flusher {
            buffer,
            transport,
            stats,
            sending: Mutex::new(()),
        }
    }
    pub fn buffer(&self) -> &Arc<BatchBuffer> {
        &self.buffer
    }
    /// Never fails, errors are logged and counted.
    pub fn flush(&self) -> FlushOutcome {
        match self.try_flush() {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("flush aborted: {}", e);
                FlushOutcome::Empty
            }
        }
    }
    fn try_flush(&self) -> Result<FlushOutcome, PktfeedError> {
        // the guard protects no data, a panicked sender leaves nothing to repair
        let _sending = self.sending.lock().unwrap_or_else(PoisonError::into_inner);
        let records = self.buffer.drain_all()?;
        if records.is_empty() {
            return Ok(FlushOutcome::Empty);
        }
        let payload = serialize_batch(&records);
        match self.transport.send(&payload) {
            Ok(_) => {
                debug!("sent {} records ({} bytes) to {}", records.len(), payload.len(), self.transport.peer());
                self.stats.flush_ok(records.len());
                Ok(FlushOutcome::Sent(records.len()))
            }
            Err(e) => {
                warn!("dropping batch of {} records: {}", records.len(), e);
                self.stats.flush_failed(records.len());
                Ok(FlushOutcome::Dropped(records.len()))
            }
        }
    }
}
