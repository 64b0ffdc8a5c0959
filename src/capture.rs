use log::debug;
use log::info;
use pnet::datalink;
use pnet::datalink::Channel::Ethernet;
use pnet::datalink::DataLinkReceiver;
use pnet::datalink::MacAddr;
use pnet::ipnetwork::IpNetwork;
use std::collections::VecDeque;
use std::io::ErrorKind;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::clock::IntervalClock;
use crate::clock::Timestamp;
use crate::config::Config;
use crate::error::PktfeedError;
use crate::feature;
use crate::flusher::FlushOutcome;
use crate::flusher::Flusher;
use crate::stats::DropReason;
use crate::stats::Stats;

/// One captured frame, link layer header included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub data: Vec<u8>,
    pub ts: Timestamp,
    /// Bytes actually captured.
    pub caplen: u32,
    /// Length of the frame on the wire.
    pub orig_len: u32,
}

impl RawFrame {
    pub fn new(data: Vec<u8>, ts: Timestamp) -> RawFrame {
        let len = data.len() as u32;
        RawFrame {
            data,
            ts,
            caplen: len,
            orig_len: len,
        }
    }
}

#[derive(Debug)]
pub enum Next {
    Frame(RawFrame),
    /// Read timeout expired without traffic.
    Timeout,
    /// The source will not deliver anything else.
    Closed,
}

/// Anything that hands out captured frames one at a time.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Next, PktfeedError>;
}

/// Frames from a fixed list, used for replay and tests.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    frames: VecDeque<RawFrame>,
}

impl ScriptedSource {
    pub fn new(frames: Vec<RawFrame>) -> ScriptedSource {
        ScriptedSource {
            frames: frames.into(),
        }
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> Result<Next, PktfeedError> {
        match self.frames.pop_front() {
            Some(frame) => Ok(Next::Frame(frame)),
            None => Ok(Next::Closed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Device {
    // Interface name.
    pub name: String,
    /// Interface description.
    pub desc: Option<String>,
    // All ip address (include IPv6 if exists).
    pub ips: Vec<IpNetwork>,
    // Mac address.
    pub mac: Option<MacAddr>,
}

impl Device {
    /// Returns all interfaces in the system.
    pub fn list() -> Vec<Device> {
        datalink::interfaces()
            .into_iter()
            .map(|n| Device {
                name: n.name,
                desc: if n.description.is_empty() {
                    None
                } else {
                    Some(n.description)
                },
                ips: n.ips,
                mac: n.mac,
            })
            .collect()
    }
}

/// Live layer 2 capture through a pnet datalink channel.
pub struct PnetSource {
    rx: Box<dyn DataLinkReceiver>,
}

impl PnetSource {
    pub fn open(iface: &str, config: &Config) -> Result<PnetSource, PktfeedError> {
        let interface = match datalink::interfaces().into_iter().find(|i| i.name == iface) {
            Some(i) => i,
            None => {
                return Err(PktfeedError::UnableFoundInterface {
                    i: iface.to_string(),
                });
            }
        };
        // zero would make the read block with no timeout
        let timeout = Duration::from_millis(config.read_timeout_ms.max(1));
        let dl_config = datalink::Config {
            write_buffer_size: config.buffer_size,
            read_buffer_size: config.buffer_size,
            read_timeout: Some(timeout),
            write_timeout: Some(timeout),
            promiscuous: config.promiscuous,
            ..Default::default()
        };
        let rx = match datalink::channel(&interface, dl_config) {
            Ok(Ethernet(_tx, rx)) => rx,
            Ok(_) => return Err(PktfeedError::UnhandledChannelType),
            Err(e) => return Err(PktfeedError::UnableCreateChannel { e: e.to_string() }),
        };
        info!("capturing on {} (promiscuous: {})", interface.name, config.promiscuous);
        Ok(PnetSource { rx })
    }
}

impl FrameSource for PnetSource {
    fn next_frame(&mut self) -> Result<Next, PktfeedError> {
        match self.rx.next() {
            Ok(data) => {
                let ts = Timestamp::now()?;
                Ok(Next::Frame(RawFrame::new(data.to_vec(), ts)))
            }
            Err(e) => match e.kind() {
                ErrorKind::TimedOut | ErrorKind::Interrupted | ErrorKind::WouldBlock => Ok(Next::Timeout),
                _ => Err(PktfeedError::CapturePacketError { e: e.to_string() }),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Buffered,
    /// The append filled the batch and triggered a flush.
    Flushed(FlushOutcome),
    Dropped(DropReason),
}

/// Per-frame pipeline: parse, interval, encode, buffer, flush when full.
pub struct CaptureDriver {
    clock: IntervalClock,
    flusher: Arc<Flusher>,
    stats: Arc<Stats>,
}

impl CaptureDriver {
    pub fn new(flusher: Arc<Flusher>, stats: Arc<Stats>) -> CaptureDriver {
        CaptureDriver {
            clock: IntervalClock::new(),
            flusher,
            stats,
        }
    }
    pub fn clock(&self) -> &IntervalClock {
        &self.clock
    }
    /// Frame arrival callback. A full batch is flushed before returning.
    pub fn handle_frame(&self, frame: &RawFrame) -> FrameOutcome {
        self.stats.frame_seen();
        let record = match feature::encode(frame, &self.clock) {
            Ok(r) => r,
            Err(e) => return self.drop_frame(e),
        };
        match self.flusher.buffer().append(record) {
            Ok(full) => {
                self.stats.record_appended();
                if full {
                    FrameOutcome::Flushed(self.flusher.flush())
                } else {
                    FrameOutcome::Buffered
                }
            }
            Err(e) => self.drop_frame(e),
        }
    }
    fn drop_frame(&self, e: PktfeedError) -> FrameOutcome {
        let reason = DropReason::classify(&e);
        debug!("drop frame: {}", e);
        self.stats.frame_dropped(reason);
        FrameOutcome::Dropped(reason)
    }
    /// Pull frames until the source closes or `running` is cleared.
    /// `running` is checked between reads, so a live source stops within one
    /// read timeout.
    pub fn run(&self, source: &mut dyn FrameSource, running: &AtomicBool) -> Result<(), PktfeedError> {
        while running.load(Ordering::SeqCst) {
            match source.next_frame()? {
                Next::Frame(frame) => {
                    self.handle_frame(&frame);
                }
                Next::Timeout => (),
                Next::Closed => {
                    info!("capture source closed");
                    break;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flusher::tests::memory_flusher;
    use crate::header::tests::ipv4_frame;

    fn frame(i: i64) -> RawFrame {
        RawFrame::new(ipv4_frame(60, 17, [192, 168, 1, 2], [192, 168, 1, 1]), Timestamp::new(i, 0))
    }

    #[test]
    fn below_threshold_never_flushes() {
        let (flusher, transport, stats) = memory_flusher(10);
        let driver = CaptureDriver::new(flusher.clone(), stats);
        for i in 0..9 {
            assert_eq!(driver.handle_frame(&frame(i)), FrameOutcome::Buffered);
        }
        assert_eq!(transport.connections(), 0);
        assert_eq!(flusher.buffer().len().unwrap(), 9);
    }

    #[test]
    fn threshold_triggers_exactly_one_flush() {
        let (flusher, transport, stats) = memory_flusher(10);
        let driver = CaptureDriver::new(flusher.clone(), stats.clone());
        let outcomes: Vec<FrameOutcome> = (0..10).map(|i| driver.handle_frame(&frame(i))).collect();
        assert_eq!(outcomes[9], FrameOutcome::Flushed(FlushOutcome::Sent(10)));
        assert_eq!(transport.connections(), 1);
        assert!(flusher.buffer().is_empty().unwrap());
        assert_eq!(transport.lines()[1], "60,17,192.168.1.2,192.168.1.1,1");
        assert_eq!(stats.snapshot().records_appended, 10);
    }

    #[test]
    fn malformed_frame_is_dropped_and_counted() {
        let (flusher, _, stats) = memory_flusher(10);
        let driver = CaptureDriver::new(flusher.clone(), stats.clone());
        let runt = RawFrame::new(vec![0xff; 33], Timestamp::new(1, 0));
        assert_eq!(driver.handle_frame(&runt), FrameOutcome::Dropped(DropReason::TooShort));
        assert!(flusher.buffer().is_empty().unwrap());
        assert_eq!(driver.clock().last(), None);
        let s = stats.snapshot();
        assert_eq!(s.frames_seen, 1);
        assert_eq!(s.dropped(DropReason::TooShort), 1);
    }

    #[test]
    fn run_until_source_closes() {
        let (flusher, transport, stats) = memory_flusher(4);
        let driver = CaptureDriver::new(flusher.clone(), stats);
        let mut source = ScriptedSource::new((0..6).map(frame).collect());
        let running = AtomicBool::new(true);
        driver.run(&mut source, &running).unwrap();
        assert_eq!(transport.connections(), 1);
        assert_eq!(flusher.buffer().len().unwrap(), 2);
    }

    #[test]
    fn run_respects_stop_flag() {
        let (flusher, _, stats) = memory_flusher(4);
        let driver = CaptureDriver::new(flusher.clone(), stats.clone());
        let mut source = ScriptedSource::new((0..6).map(frame).collect());
        let running = AtomicBool::new(false);
        driver.run(&mut source, &running).unwrap();
        assert_eq!(stats.snapshot().frames_seen, 0);
    }
}
