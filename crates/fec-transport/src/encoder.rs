//! Sender-side group encoder.
//!
//! Batches k payloads into one coding group and emits all n coded packets
//! ready for the wire. Data shares carry their original payloads at their
//! true lengths; parity shares are computed over the zero-padded stripes
//! and always span the full stripe. The group sequence increments mod 256
//! per emitted group.

use crate::codec::FecCodec;
use crate::error::FecError;
use crate::packet::{CodedPacket, PacketHeader, MAX_PAYLOAD_SIZE, PACKET_VERSION};

pub struct GroupEncoder {
    codec: FecCodec,
    share_len: usize,
    next_seq: u8,
}

impl GroupEncoder {
    /// `k`, `n` bounded by the wire header (1..=255); `share_len` bounded
    /// by the wire payload field.
    pub fn new(k: usize, n: usize, share_len: usize) -> Result<Self, FecError> {
        if n > 255 {
            return Err(FecError::InvalidParameters { k, n });
        }
        if share_len == 0 || share_len > MAX_PAYLOAD_SIZE {
            return Err(FecError::InvalidParameters { k, n });
        }
        let codec = FecCodec::new(k, n)?;
        Ok(Self { codec, share_len, next_seq: 0 })
    }

    pub fn k(&self) -> usize {
        self.codec.k()
    }

    pub fn n(&self) -> usize {
        self.codec.n()
    }

    pub fn share_len(&self) -> usize {
        self.share_len
    }

    /// Sequence number the next group will be stamped with.
    pub fn next_seq(&self) -> u8 {
        self.next_seq
    }

    /// Encode one group of exactly k payloads (each at most `share_len`
    /// bytes) into n serialized packets.
    pub fn encode_group(
        &mut self,
        payloads: &[&[u8]],
        tstamp: u32,
    ) -> Result<Vec<Vec<u8>>, FecError> {
        let k = self.codec.k();
        let n = self.codec.n();
        if payloads.len() != k || payloads.iter().any(|p| p.len() > self.share_len) {
            return Err(FecError::InvalidParameters { k, n });
        }

        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);

        // Parity is computed over zero-padded stripes; `encode` pads short
        // rows itself, so the payload slices go in as-is.
        let mut stripe = vec![0u8; self.share_len];
        let mut packets = Vec::with_capacity(n);
        for index in 0..n {
            let header = PacketHeader {
                version: PACKET_VERSION,
                group_seq: seq,
                share_index: index as u8,
                k: k as u8,
                n: n as u8,
                share_len: self.share_len as u16,
                group_tstamp: tstamp,
            };

            let bytes = if index < k {
                // Systematic share: ship the payload at its true length.
                CodedPacket::new(header, payloads[index])?.to_bytes()
            } else {
                self.codec.encode(payloads, index, &mut stripe)?;
                CodedPacket::new(header, &stripe)?.to_bytes()
            };
            packets.push(bytes);
        }
        Ok(packets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::HEADER_SIZE;

    #[test]
    fn test_rejects_bad_geometry() {
        assert!(GroupEncoder::new(4, 256, 16).is_err());
        assert!(GroupEncoder::new(4, 8, 0).is_err());
        assert!(GroupEncoder::new(4, 8, MAX_PAYLOAD_SIZE + 1).is_err());
        assert!(GroupEncoder::new(0, 8, 16).is_err());
        assert!(GroupEncoder::new(4, 8, 16).is_ok());
    }

    #[test]
    fn test_emits_n_packets_with_sequenced_headers() {
        let mut enc = GroupEncoder::new(2, 4, 8).unwrap();
        let payloads: [&[u8]; 2] = [&[1, 2, 3], &[4, 5, 6, 7, 8, 9, 10, 11]];

        let first = enc.encode_group(&payloads, 555).unwrap();
        assert_eq!(first.len(), 4);
        for (i, bytes) in first.iter().enumerate() {
            let pkt = CodedPacket::parse(bytes).unwrap();
            assert_eq!(pkt.header.group_seq, 0);
            assert_eq!(pkt.header.share_index, i as u8);
            assert_eq!(pkt.header.k, 2);
            assert_eq!(pkt.header.n, 4);
            assert_eq!(pkt.header.share_len, 8);
            assert_eq!(pkt.header.group_tstamp, 555);
        }

        // Data shares keep their true lengths; parity spans the stripe.
        assert_eq!(first[0].len(), HEADER_SIZE + 3);
        assert_eq!(first[1].len(), HEADER_SIZE + 8);
        assert_eq!(first[2].len(), HEADER_SIZE + 8);

        let second = enc.encode_group(&payloads, 556).unwrap();
        assert_eq!(CodedPacket::parse(&second[0]).unwrap().header.group_seq, 1);
    }

    #[test]
    fn test_sequence_wraps() {
        let mut enc = GroupEncoder::new(1, 1, 4).unwrap();
        let payloads: [&[u8]; 1] = [&[0]];
        for _ in 0..256 {
            enc.encode_group(&payloads, 0).unwrap();
        }
        assert_eq!(enc.next_seq(), 0);
    }

    #[test]
    fn test_rejects_oversized_payload() {
        let mut enc = GroupEncoder::new(2, 4, 4).unwrap();
        let payloads: [&[u8]; 2] = [&[1, 2, 3, 4, 5], &[1]];
        assert!(enc.encode_group(&payloads, 0).is_err());
    }

    #[test]
    fn test_rejects_wrong_payload_count() {
        let mut enc = GroupEncoder::new(3, 5, 4).unwrap();
        let payloads: [&[u8]; 2] = [&[1], &[2]];
        assert!(enc.encode_group(&payloads, 0).is_err());
    }
}
