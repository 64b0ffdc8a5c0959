use log::debug;
use log::info;
use log::warn;
use std::sync::Arc;
use std::sync::mpsc;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::mpsc::Sender;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::PktfeedError;
use crate::flusher::FlushOutcome;
use crate::flusher::Flusher;

/// Background thread flushing the batch on a fixed cadence, independent of
/// traffic volume.
pub struct FlushTimer {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl FlushTimer {
    pub fn spawn(flusher: Arc<Flusher>, interval: Duration) -> Result<FlushTimer, PktfeedError> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name(String::from("flush-timer"))
            .spawn(move || {
                debug!("flush timer started, interval {:?}", interval);
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            flusher.flush();
                        }
                        // stop requested or the owner went away
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                match flusher.flush() {
                    FlushOutcome::Sent(n) => info!("final flush sent {} records", n),
                    FlushOutcome::Dropped(n) => warn!("final flush dropped {} records", n),
                    FlushOutcome::Empty => (),
                }
                debug!("flush timer stopped");
            })?;
        Ok(FlushTimer { stop_tx, handle })
    }
    /// Stop the loop, run one last flush and wait for the thread.
    pub fn stop(self) -> Result<(), PktfeedError> {
        let _ = self.stop_tx.send(());
        self.handle.join().map_err(|panic| {
            let e = if let Some(s) = panic.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                String::from("unknown panic payload")
            };
            PktfeedError::ThreadPanic {
                name: String::from("flush-timer"),
                e,
            }
        })
    }
}
