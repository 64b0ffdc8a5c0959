use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::error::PktfeedError;

/// Capture timestamp, seconds plus microseconds like `struct timeval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timestamp {
    pub tv_sec: i64,
    pub tv_usec: i64,
}

impl Timestamp {
    pub fn new(tv_sec: i64, tv_usec: i64) -> Timestamp {
        Timestamp { tv_sec, tv_usec }
    }
    pub fn now() -> Result<Timestamp, PktfeedError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| PktfeedError::CapturePacketError { e: e.to_string() })?;
        Ok(Timestamp {
            tv_sec: now.as_secs() as i64,
            tv_usec: now.subsec_micros() as i64,
        })
    }
    // i128 holds any tv_sec scaled to microseconds
    fn as_micros(&self) -> i128 {
        self.tv_sec as i128 * 1_000_000 + self.tv_usec as i128
    }
}

/// Timestamp of the last processed packet.
///
/// The read of the previous value and the store of the new one happen under
/// one lock, so concurrent callers each see a distinct predecessor.
#[derive(Debug, Default)]
pub struct IntervalClock {
    last: Mutex<Option<Timestamp>>,
}

impl IntervalClock {
    pub fn new() -> IntervalClock {
        IntervalClock {
            last: Mutex::new(None),
        }
    }
    /// Seconds elapsed since the previous call, then `now` becomes the baseline.
    ///
    /// The first call returns `0.0`. A timestamp older than the baseline also
    /// returns `0.0` instead of a negative interval.
    pub fn elapsed_since(&self, now: Timestamp) -> Result<f64, PktfeedError> {
        let mut last = self.last.lock().map_err(|_| PktfeedError::UnlockError {
            name: String::from("IntervalClock"),
        })?;
        let interval = match *last {
            Some(prev) => {
                let micros = now.as_micros() - prev.as_micros();
                if micros > 0 {
                    micros as f64 / 1e6
                } else {
                    0.0
                }
            }
            None => 0.0,
        };
        *last = Some(now);
        Ok(interval)
    }
    pub fn last(&self) -> Option<Timestamp> {
        match self.last.lock() {
            Ok(l) => *l,
            Err(_) => None,
        }
    }
}
