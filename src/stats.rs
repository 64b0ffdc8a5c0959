use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use strum::IntoEnumIterator;
use strum_macros::Display;
use strum_macros::EnumIter;

use crate::error::PktfeedError;

/// Why a captured frame produced no record.
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DropReason {
    TooShort = 0,
    Encoding = 1,
    Internal = 2,
}

impl DropReason {
    pub fn classify(e: &PktfeedError) -> DropReason {
        match e {
            PktfeedError::TooShort { .. } => DropReason::TooShort,
            PktfeedError::EncodingError { .. } => DropReason::Encoding,
            _ => DropReason::Internal,
        }
    }
}

const DROP_REASONS: usize = 3;

/// Pipeline counters, shared by the capture thread and the flush timer.
#[derive(Debug, Default)]
pub struct Stats {
    frames_seen: AtomicU64,
    records_appended: AtomicU64,
    dropped: [AtomicU64; DROP_REASONS],
    flushes_ok: AtomicU64,
    flushes_failed: AtomicU64,
    records_sent: AtomicU64,
    records_lost: AtomicU64,
}

impl Stats {
    pub fn new() -> Stats {
        Stats::default()
    }
    pub fn frame_seen(&self) {
        self.frames_seen.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_appended(&self) {
        self.records_appended.fetch_add(1, Ordering::Relaxed);
    }
    pub fn frame_dropped(&self, reason: DropReason) {
        self.dropped[reason as usize].fetch_add(1, Ordering::Relaxed);
    }
    pub fn flush_ok(&self, records: usize) {
        self.flushes_ok.fetch_add(1, Ordering::Relaxed);
        self.records_sent.fetch_add(records as u64, Ordering::Relaxed);
    }
    pub fn flush_failed(&self, records: usize) {
        self.flushes_failed.fetch_add(1, Ordering::Relaxed);
        self.records_lost.fetch_add(records as u64, Ordering::Relaxed);
    }
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_seen: self.frames_seen.load(Ordering::Relaxed),
            records_appended: self.records_appended.load(Ordering::Relaxed),
            dropped: DropReason::iter()
                .map(|r| (r, self.dropped[r as usize].load(Ordering::Relaxed)))
                .collect(),
            flushes_ok: self.flushes_ok.load(Ordering::Relaxed),
            flushes_failed: self.flushes_failed.load(Ordering::Relaxed),
            records_sent: self.records_sent.load(Ordering::Relaxed),
            records_lost: self.records_lost.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub frames_seen: u64,
    pub records_appended: u64,
    pub dropped: Vec<(DropReason, u64)>,
    pub flushes_ok: u64,
    pub flushes_failed: u64,
    pub records_sent: u64,
    pub records_lost: u64,
}

impl StatsSnapshot {
    pub fn dropped(&self, reason: DropReason) -> u64 {
        self.dropped
            .iter()
            .find(|(r, _)| *r == reason)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "frames={} appended={} sent={} lost={} flushes_ok={} flushes_failed={}",
            self.frames_seen,
            self.records_appended,
            self.records_sent,
            self.records_lost,
            self.flushes_ok,
            self.flushes_failed
        )?;
        for (reason, n) in &self.dropped {
            write!(f, " dropped_{}={}", reason, n)?;
        }
        Ok(())
    }
}
