//! Live packet capture to CSV feature batches over TCP.
//!
//! Every captured frame is parsed as ethernet + ipv4 and turned into one
//! `packet_size,protocol,source,destination,interval` record. Records are
//! buffered and pushed to a downstream service over a fresh TCP connection
//! whenever the batch is full or the flush timer fires.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::sync::atomic::AtomicBool;
//! use pktfeed::{BatchBuffer, CaptureDriver, Config, FlushTimer, Flusher, PnetSource, Stats, TcpClient};
//!
//! fn main() {
//!     let config = Config::default();
//!     let stats = Arc::new(Stats::new());
//!     let buffer = Arc::new(BatchBuffer::new(config.batch_size));
//!     let client = TcpClient::new(&config.host, config.port);
//!     let flusher = Arc::new(Flusher::new(buffer, Box::new(client), stats.clone()));
//!     let timer = FlushTimer::spawn(flusher.clone(), config.flush_interval()).unwrap();
//!
//!     let mut source = PnetSource::open("ens33", &config).unwrap();
//!     let driver = CaptureDriver::new(flusher, stats);
//!     driver.run(&mut source, &AtomicBool::new(true)).unwrap();
//!     timer.stop().unwrap();
//! }
//! ```
use std::result;

pub mod batch;
pub mod capture;
pub mod clock;
pub mod config;
pub mod error;
pub mod feature;
pub mod flusher;
pub mod header;
pub mod logging;
pub mod stats;
pub mod timer;
pub mod transport;

pub use batch::BatchBuffer;
pub use capture::CaptureDriver;
pub use capture::Device;
pub use capture::FrameOutcome;
pub use capture::FrameSource;
pub use capture::Next;
pub use capture::PnetSource;
pub use capture::RawFrame;
pub use capture::ScriptedSource;
pub use clock::IntervalClock;
pub use clock::Timestamp;
pub use config::Config;
pub use error::PktfeedError;
pub use feature::FeatureRecord;
pub use flusher::FlushOutcome;
pub use flusher::Flusher;
pub use header::Ipv4Header;
pub use stats::DropReason;
pub use stats::Stats;
pub use timer::FlushTimer;
pub use transport::TcpClient;
pub use transport::Transport;

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_BUFFER_SIZE: usize = 65535;
pub const DEFAULT_NET_TIMEOUT_MS: u64 = 1000;

pub type Result<T, E = error::PktfeedError> = result::Result<T, E>;
