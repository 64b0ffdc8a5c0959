use pnet::packet::ipv4::Ipv4Packet;
use std::net::Ipv4Addr;

use crate::error::PktfeedError;

/// Ethernet II header size, the IPv4 header always starts here.
pub const ETHERNET_HEADER_LEN: usize = 14;
/// IPv4 header without options.
pub const IPV4_MIN_HEADER_LEN: usize = 20;
/// Smallest frame that can be interpreted as ethernet + ipv4.
pub const MIN_FRAME_LEN: usize = ETHERNET_HEADER_LEN + IPV4_MIN_HEADER_LEN;

/// Fixed IPv4 header fields read from a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    pub version: u8,
    /// Header length in 32 bit words.
    pub header_length: u8,
    pub tos: u8,
    pub total_length: u16,
    pub identification: u16,
    pub flags: u8,
    pub fragment_offset: u16,
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
}

impl Ipv4Header {
    /// Interpret the bytes after the ethernet header as an IPv4 header.
    /// The EtherType is not inspected, non-IPv4 frames yield whatever the
    /// bytes at that offset happen to contain.
    pub fn parse(frame: &[u8]) -> Result<Ipv4Header, PktfeedError> {
        if frame.len() < MIN_FRAME_LEN {
            return Err(PktfeedError::TooShort {
                len: frame.len(),
                min: MIN_FRAME_LEN,
            });
        }
        let ipv4_packet = match Ipv4Packet::new(&frame[ETHERNET_HEADER_LEN..]) {
            Some(p) => p,
            None => {
                return Err(PktfeedError::TooShort {
                    len: frame.len(),
                    min: MIN_FRAME_LEN,
                });
            }
        };
        Ok(Ipv4Header {
            version: ipv4_packet.get_version(),
            header_length: ipv4_packet.get_header_length(),
            tos: (ipv4_packet.get_dscp() << 2) | ipv4_packet.get_ecn(),
            total_length: ipv4_packet.get_total_length(),
            identification: ipv4_packet.get_identification(),
            flags: ipv4_packet.get_flags(),
            fragment_offset: ipv4_packet.get_fragment_offset(),
            ttl: ipv4_packet.get_ttl(),
            protocol: ipv4_packet.get_next_level_protocol().0,
            checksum: ipv4_packet.get_checksum(),
            source: ipv4_packet.get_source(),
            destination: ipv4_packet.get_destination(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Ethernet + minimal IPv4 header, zero padded to `frame_len`.
    pub(crate) fn ipv4_frame(frame_len: usize, protocol: u8, src: [u8; 4], dst: [u8; 4]) -> Vec<u8> {
        let mut frame = vec![
            0x0, 0xc, 0x29, 0x82, 0x7f, 0x58, 0x0, 0x50, 0x56, 0xc0, 0x0, 0x8, 0x8, 0x0, 0x45,
            0x0,
        ];
        let total_length = (frame_len.max(MIN_FRAME_LEN) - ETHERNET_HEADER_LEN) as u16;
        frame.extend_from_slice(&total_length.to_be_bytes());
        frame.extend_from_slice(&[0xed, 0x3f, 0x40, 0x0, 0x40, protocol, 0x81, 0x9a]);
        frame.extend_from_slice(&src);
        frame.extend_from_slice(&dst);
        frame.resize(frame_len.max(MIN_FRAME_LEN), 0);
        frame
    }

    #[test]
    fn parse_tcp_frame() {
        // captured SYN 192.168.5.1 -> 192.168.5.152:80
        let packet_data = vec![
            0x0, 0xc, 0x29, 0x82, 0x7f, 0x58, 0x0, 0x50, 0x56, 0xc0, 0x0, 0x8, 0x8, 0x0, 0x45, 0x0,
            0x0, 0x34, 0xed, 0x3f, 0x40, 0x0, 0x80, 0x6, 0x81, 0x9a, 0xc0, 0xa8, 0x5, 0x1, 0xc0,
            0xa8, 0x5, 0x98, 0xd0, 0x4d, 0x0, 0x50, 0x6e, 0x85, 0x6d, 0xe6, 0x0, 0x0, 0x0, 0x0,
            0x80, 0x2, 0xff, 0xff, 0x36, 0x1d, 0x0, 0x0, 0x2, 0x4, 0x5, 0xb4, 0x1, 0x3, 0x3, 0x8,
            0x1, 0x1, 0x4, 0x2,
        ];
        let header = Ipv4Header::parse(&packet_data).unwrap();
        assert_eq!(header.version, 4);
        assert_eq!(header.header_length, 5);
        assert_eq!(header.total_length, 0x34);
        assert_eq!(header.identification, 0xed3f);
        assert_eq!(header.flags, 0b010);
        assert_eq!(header.ttl, 128);
        assert_eq!(header.protocol, 6);
        assert_eq!(header.checksum, 0x819a);
        assert_eq!(header.source, Ipv4Addr::new(192, 168, 5, 1));
        assert_eq!(header.destination, Ipv4Addr::new(192, 168, 5, 152));
    }

    #[test]
    fn short_frames_are_rejected() {
        let frame = ipv4_frame(MIN_FRAME_LEN, 17, [10, 0, 0, 1], [10, 0, 0, 2]);
        for len in 0..MIN_FRAME_LEN {
            match Ipv4Header::parse(&frame[..len]) {
                Err(PktfeedError::TooShort { len: l, min }) => {
                    assert_eq!(l, len);
                    assert_eq!(min, MIN_FRAME_LEN);
                }
                other => panic!("expected TooShort for {} bytes, got {:?}", len, other),
            }
        }
        let header = Ipv4Header::parse(&frame).unwrap();
        assert_eq!(header.protocol, 17);
        assert_eq!(header.source, Ipv4Addr::new(10, 0, 0, 1));
    }

    #[test]
    fn ethertype_is_not_checked() {
        let mut frame = ipv4_frame(60, 1, [1, 2, 3, 4], [5, 6, 7, 8]);
        // arp ethertype, bytes are still read as ipv4
        frame[12] = 0x08;
        frame[13] = 0x06;
        let header = Ipv4Header::parse(&frame).unwrap();
        assert_eq!(header.protocol, 1);
        assert_eq!(header.destination, Ipv4Addr::new(5, 6, 7, 8));
    }
}
