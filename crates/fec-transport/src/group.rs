//! One coding group: the n shares produced from a batch of k packets.
//!
//! A group accumulates share payloads into an index-aligned stripe buffer
//! until k distinct shares are present, then decodes in place. Duplicate
//! deliveries are no-ops, and a group that has decoded ignores all further
//! insertion. Buffers are owned and bounds-checked; a share lives at
//! offset `index * share_len`.

use crate::codec::FecCodec;
use crate::error::FecError;
use crate::packet::PacketHeader;

/// What one insertion did to the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Share stored; the group still needs more.
    Inserted,
    /// Share index already present (or the group already decoded); state
    /// unchanged.
    Duplicate,
    /// This share was the k-th: the group decoded successfully.
    Completed,
    /// Decode was attempted and failed, but undelivered shares remain, so
    /// the group keeps assembling.
    Pending,
}

pub struct FecGroup {
    k: usize,
    n: usize,
    share_len: usize,
    seq: u8,
    /// Group timestamp in microseconds, as carried on the wire.
    tstamp: u32,
    /// Per-index arrival flags.
    received: Vec<bool>,
    /// Payload length per share; defaults to `share_len`, so reconstructed
    /// rows report the full stripe.
    lengths: Vec<usize>,
    rcvd: usize,
    /// n × share_len stripe buffer.
    buf: Vec<u8>,
    decoded: bool,
    /// Data shares rebuilt by the decode (as opposed to received).
    recovered: usize,
}

impl FecGroup {
    /// Open a group from the first packet's header fields.
    pub fn new(hdr: &PacketHeader) -> Result<Self, FecError> {
        Self::from_params(
            hdr.k as usize,
            hdr.n as usize,
            hdr.share_len as usize,
            hdr.group_seq,
            hdr.group_tstamp,
        )
    }

    pub fn from_params(
        k: usize,
        n: usize,
        share_len: usize,
        seq: u8,
        tstamp: u32,
    ) -> Result<Self, FecError> {
        if k < 1 || k > n || n > 256 || share_len == 0 {
            return Err(FecError::InvalidParameters { k, n });
        }
        Ok(Self {
            k,
            n,
            share_len,
            seq,
            tstamp,
            received: vec![false; n],
            lengths: vec![share_len; n],
            rcvd: 0,
            buf: vec![0u8; n * share_len],
            decoded: false,
            recovered: 0,
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn share_len(&self) -> usize {
        self.share_len
    }

    pub fn seq(&self) -> u8 {
        self.seq
    }

    pub fn tstamp(&self) -> u32 {
        self.tstamp
    }

    pub fn received_count(&self) -> usize {
        self.rcvd
    }

    pub fn recovered_count(&self) -> usize {
        self.recovered
    }

    pub fn is_decoded(&self) -> bool {
        self.decoded
    }

    pub fn has_share(&self, index: usize) -> bool {
        self.received.get(index).copied().unwrap_or(false)
    }

    /// Whether a packet header describes this same group.
    pub fn matches(&self, hdr: &PacketHeader) -> bool {
        self.seq == hdr.group_seq
            && self.k == hdr.k as usize
            && self.n == hdr.n as usize
            && self.share_len == hdr.share_len as usize
    }

    /// Store one share payload. Payloads shorter than the stripe keep the
    /// zero-filled tail (the padding the parity rows were computed over);
    /// longer payloads are truncated. The k-th distinct share triggers the
    /// in-place decode.
    pub fn insert(&mut self, share_index: usize, payload: &[u8]) -> Result<InsertOutcome, FecError> {
        if share_index >= self.n {
            return Err(FecError::ShareIndexOutOfRange { index: share_index, n: self.n });
        }
        if self.decoded || self.received[share_index] {
            return Ok(InsertOutcome::Duplicate);
        }

        let len = payload.len().min(self.share_len);
        let off = share_index * self.share_len;
        self.buf[off..off + len].copy_from_slice(&payload[..len]);
        self.received[share_index] = true;
        self.lengths[share_index] = len;
        self.rcvd += 1;

        if self.rcvd < self.k {
            return Ok(InsertOutcome::Inserted);
        }

        match self.try_decode() {
            Ok(()) => {
                self.decoded = true;
                Ok(InsertOutcome::Completed)
            }
            Err(e) if self.rcvd >= self.n => {
                tracing::debug!(
                    seq = self.seq,
                    k = self.k,
                    n = self.n,
                    error = %e,
                    "group exhausted without decoding"
                );
                Err(FecError::DecodeFailed("group exhausted"))
            }
            Err(e) => {
                tracing::debug!(seq = self.seq, error = %e, "decode attempt failed, awaiting more shares");
                Ok(InsertOutcome::Pending)
            }
        }
    }

    fn try_decode(&mut self) -> Result<(), FecError> {
        let mut indices: Vec<usize> = (0..self.n).filter(|&i| self.received[i]).collect();
        indices.truncate(self.k);

        let codec = FecCodec::new(self.k, self.n)?;
        codec.decode(&mut self.buf, &mut indices, self.share_len)?;
        self.recovered = (0..self.k).filter(|&i| !self.received[i]).count();
        Ok(())
    }

    /// The k original payloads, trimmed to their true lengths. `None`
    /// until the group has decoded. Reconstructed rows span the full
    /// stripe; the wire only carries exact lengths for delivered shares.
    pub fn data_rows(&self) -> Option<Vec<&[u8]>> {
        if !self.decoded {
            return None;
        }
        Some(
            (0..self.k)
                .map(|i| {
                    let off = i * self.share_len;
                    &self.buf[off..off + self.lengths[i]]
                })
                .collect(),
        )
    }

    /// One data row with its true length; `None` before decode or for
    /// `index >= k`.
    pub fn data_row(&self, index: usize) -> Option<&[u8]> {
        if !self.decoded || index >= self.k {
            return None;
        }
        let off = index * self.share_len;
        Some(&self.buf[off..off + self.lengths[index]])
    }
}
