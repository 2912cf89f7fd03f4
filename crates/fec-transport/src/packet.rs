//! Wire framing for one coded share.
//!
//! A coded packet is a fixed 14-byte header followed by the share payload.
//! Multi-byte fields are big-endian:
//!
//! ```text
//! byte  0      = magic (0xFE)
//! byte  1      = version (1)
//! byte  2      = group sequence (mod 256)
//! byte  3      = share index
//! byte  4      = k
//! byte  5      = n
//! bytes 6..8   = share length (u16)
//! bytes 8..10  = payload length (u16)
//! bytes 10..14 = group timestamp, µs (u32)
//! ```
//!
//! Parsing borrows the payload from the input buffer; the receive path
//! copies it into a group's stripe buffer and drops the packet value.

use crate::error::FecError;

pub const PACKET_MAGIC: u8 = 0xfe;
pub const PACKET_VERSION: u8 = 1;
pub const HEADER_SIZE: usize = 14;
/// Maximum total packet size on the wire.
pub const MAX_PACKET_SIZE: usize = 65535;
pub const MAX_PAYLOAD_SIZE: usize = MAX_PACKET_SIZE - HEADER_SIZE;

/// Parsed header of a coded packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub version: u8,
    pub group_seq: u8,
    pub share_index: u8,
    pub k: u8,
    pub n: u8,
    pub share_len: u16,
    /// Group timestamp in microseconds.
    pub group_tstamp: u32,
}

/// One coded share as carried on the wire. The payload borrows from the
/// receive buffer; nothing here owns heap memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodedPacket<'a> {
    pub header: PacketHeader,
    pub payload: &'a [u8],
}

impl<'a> CodedPacket<'a> {
    pub fn new(header: PacketHeader, payload: &'a [u8]) -> Result<Self, FecError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(FecError::MalformedPacket("payload exceeds wire maximum"));
        }
        Ok(Self { header, payload })
    }

    /// Parse one datagram. Fails on a short buffer, a bad magic byte, or a
    /// declared payload length that disagrees with the buffer; no partial
    /// packet is ever produced.
    pub fn parse(buf: &'a [u8]) -> Result<Self, FecError> {
        if buf.len() < HEADER_SIZE {
            return Err(FecError::MalformedPacket("buffer shorter than header"));
        }
        if buf[0] != PACKET_MAGIC {
            return Err(FecError::MalformedPacket("bad magic byte"));
        }

        let payload_len = u16::from_be_bytes([buf[8], buf[9]]) as usize;
        if buf.len() - HEADER_SIZE != payload_len {
            return Err(FecError::MalformedPacket("payload length mismatch"));
        }

        let header = PacketHeader {
            version: buf[1],
            group_seq: buf[2],
            share_index: buf[3],
            k: buf[4],
            n: buf[5],
            share_len: u16::from_be_bytes([buf[6], buf[7]]),
            group_tstamp: u32::from_be_bytes([buf[10], buf[11], buf[12], buf[13]]),
        };
        Ok(Self { header, payload: &buf[HEADER_SIZE..] })
    }

    pub fn serialize_into(&self, out: &mut Vec<u8>) {
        let h = &self.header;
        out.reserve(HEADER_SIZE + self.payload.len());
        out.push(PACKET_MAGIC);
        out.push(h.version);
        out.push(h.group_seq);
        out.push(h.share_index);
        out.push(h.k);
        out.push(h.n);
        out.extend_from_slice(&h.share_len.to_be_bytes());
        out.extend_from_slice(&(self.payload.len() as u16).to_be_bytes());
        out.extend_from_slice(&h.group_tstamp.to_be_bytes());
        out.extend_from_slice(self.payload);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        self.serialize_into(&mut out);
        out
    }
}
