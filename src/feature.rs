use std::fmt;
use std::net::Ipv4Addr;

use crate::capture::RawFrame;
use crate::clock::IntervalClock;
use crate::error::PktfeedError;
use crate::header::Ipv4Header;

/// One packet worth of features, serialized as
/// `packet_size,protocol,source,destination,interval`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRecord {
    /// Original on-wire length.
    pub packet_size: u32,
    pub protocol: u8,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    /// Seconds since the previous processed packet.
    pub interval: f64,
}

impl fmt::Display for FeatureRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{}",
            self.packet_size, self.protocol, self.source, self.destination, self.interval
        )
    }
}

impl FeatureRecord {
    /// Parse the frame and take the interval from `clock`.
    ///
    /// The clock only advances when the header parsed, a dropped frame does
    /// not shift the baseline of the next one.
    pub fn extract(frame: &RawFrame, clock: &IntervalClock) -> Result<FeatureRecord, PktfeedError> {
        let header = Ipv4Header::parse(&frame.data)?;
        let interval = clock.elapsed_since(frame.ts)?;
        Ok(FeatureRecord {
            packet_size: frame.orig_len,
            protocol: header.protocol,
            source: header.source,
            destination: header.destination,
            interval,
        })
    }
    pub fn to_csv(&self) -> Result<String, PktfeedError> {
        if !self.interval.is_finite() || self.interval < 0.0 {
            return Err(PktfeedError::EncodingError {
                e: format!("invalid interval {}", self.interval),
            });
        }
        Ok(self.to_string())
    }
}

/// Extract and serialize in one step, the string never contains a newline.
pub fn encode(frame: &RawFrame, clock: &IntervalClock) -> Result<String, PktfeedError> {
    let record = FeatureRecord::extract(frame, clock)?;
    record.to_csv()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Timestamp;
    use crate::header::tests::ipv4_frame;

    fn frame(len: usize, sec: i64, usec: i64) -> RawFrame {
        RawFrame::new(ipv4_frame(len, 6, [10, 0, 0, 1], [10, 0, 0, 2]), Timestamp::new(sec, usec))
    }

    #[test]
    fn encode_sequence() {
        let clock = IntervalClock::new();
        let records: Vec<String> = [(60, 0), (1500, 500_000), (40, 750_000)]
            .iter()
            .map(|&(len, usec)| encode(&frame(len, 0, usec), &clock).unwrap())
            .collect();
        assert_eq!(
            records,
            vec![
                "60,6,10.0.0.1,10.0.0.2,0",
                "1500,6,10.0.0.1,10.0.0.2,0.5",
                "40,6,10.0.0.1,10.0.0.2,0.25",
            ]
        );
    }

    #[test]
    fn packet_size_uses_wire_length() {
        let clock = IntervalClock::new();
        let mut f = frame(64, 1, 0);
        // snaplen truncated capture
        f.orig_len = 9000;
        let record = FeatureRecord::extract(&f, &clock).unwrap();
        assert_eq!(record.packet_size, 9000);
        assert!(!record.to_csv().unwrap().contains('\n'));
    }

    #[test]
    fn short_frame_does_not_touch_clock() {
        let clock = IntervalClock::new();
        encode(&frame(60, 1, 0), &clock).unwrap();
        let short = RawFrame::new(vec![0u8; 20], Timestamp::new(5, 0));
        assert!(matches!(
            encode(&short, &clock),
            Err(PktfeedError::TooShort { len: 20, .. })
        ));
        assert_eq!(clock.last(), Some(Timestamp::new(1, 0)));
        assert_eq!(encode(&frame(60, 2, 0), &clock).unwrap(), "60,6,10.0.0.1,10.0.0.2,1");
    }

    #[test]
    fn non_finite_interval_is_an_encoding_error() {
        let record = FeatureRecord {
            packet_size: 60,
            protocol: 17,
            source: Ipv4Addr::new(1, 1, 1, 1),
            destination: Ipv4Addr::new(8, 8, 8, 8),
            interval: f64::NAN,
        };
        assert!(matches!(record.to_csv(), Err(PktfeedError::EncodingError { .. })));
    }
}
