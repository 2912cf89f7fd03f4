//! Sliding window of coding groups, keyed by group sequence number.
//!
//! A fixed-capacity ring of group slots. The slot at `start` is anchored
//! to `start_seq`; an incoming packet's position is the mod-256 distance
//! from that anchor read as a small signed delta, which tolerates bounded
//! reordering and sequence wraparound. Packets landing before the window
//! grow it backward when room allows and are otherwise dropped as stale;
//! packets too far ahead are dropped rather than evicting live groups —
//! eviction is the caller's call, by popping from the front.
//!
//! Not synchronized: exactly one thread owns and feeds a buffer. Callers
//! with several producers funnel them through a channel into that owner
//! (see the probe's receive loop).

use std::sync::atomic::Ordering::Relaxed;
use std::sync::Arc;

use crate::error::FecError;
use crate::group::{FecGroup, InsertOutcome};
use crate::metrics::TransportMetrics;
use crate::packet::CodedPacket;

/// Where a packet ended up, including the drop outcomes that are normal
/// network weather rather than errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertStatus {
    /// Stored in a group that still needs more shares.
    Inserted,
    /// Share already present; nothing changed.
    Duplicate,
    /// The packet completed its group; the group decoded.
    GroupCompleted,
    /// Decode was attempted and failed but the group keeps assembling.
    DecodePending,
    /// The group ran out of shares without decoding; it stays in the
    /// window until popped.
    GroupFailed,
    /// Packet predates the window by more than the buffer can grow.
    DroppedStale,
    /// Packet is beyond the forward edge of the window.
    DroppedOverflow,
}

pub struct GroupBuffer {
    slots: Vec<Option<FecGroup>>,
    /// Oldest slot in the window.
    start: usize,
    /// One past the newest slot; always a logically empty slot.
    end: usize,
    /// Group sequence anchored at `start`. Meaningless until `anchored`.
    start_seq: u8,
    anchored: bool,
    /// Occupied (non-Empty) slots.
    occupied: usize,
    metrics: Arc<TransportMetrics>,
}

impl GroupBuffer {
    pub fn new(capacity: usize, metrics: Arc<TransportMetrics>) -> Result<Self, FecError> {
        if capacity == 0 {
            return Err(FecError::InvalidParameters { k: 0, n: 0 });
        }
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Ok(Self {
            slots,
            start: 0,
            end: 0,
            start_seq: 0,
            anchored: false,
            occupied: 0,
            metrics,
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Window length: distance from `start` to `end`.
    pub fn len(&self) -> usize {
        let cap = self.capacity();
        (self.end + cap - self.start) % cap
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Occupied slots (the window may contain gaps for groups whose first
    /// packet never arrived).
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    /// Route one parsed packet to its group, opening the group if the slot
    /// is empty.
    pub fn insert(&mut self, pkt: &CodedPacket<'_>) -> Result<InsertStatus, FecError> {
        let hdr = &pkt.header;
        self.metrics.packets_received.fetch_add(1, Relaxed);

        if hdr.share_index as usize >= hdr.n as usize {
            self.metrics.packets_malformed.fetch_add(1, Relaxed);
            return Err(FecError::ShareIndexOutOfRange {
                index: hdr.share_index as usize,
                n: hdr.n as usize,
            });
        }
        if hdr.k == 0 || hdr.k > hdr.n || hdr.share_len == 0 {
            self.metrics.packets_malformed.fetch_add(1, Relaxed);
            return Err(FecError::InvalidParameters {
                k: hdr.k as usize,
                n: hdr.n as usize,
            });
        }

        let cap = self.capacity();
        let mut delta: i32 = if !self.anchored {
            self.anchored = true;
            self.start_seq = hdr.group_seq;
            0
        } else {
            let d = hdr.group_seq.wrapping_sub(self.start_seq) as i8 as i32;
            if d > 0 && self.is_empty() {
                // Nothing live in the window; slide it to the stream
                // instead of treating the gap as overflow.
                self.start_seq = hdr.group_seq;
                0
            } else {
                d
            }
        };

        if delta < 0 {
            // Grow the window backward while the end-slot sentinel still
            // fits; otherwise the packet is too old to recover.
            let grown = self.len() as i32 - delta;
            if grown < cap as i32 {
                let shift = (-delta) as usize;
                self.start = (self.start + cap - shift) % cap;
                self.start_seq = self.start_seq.wrapping_sub(shift as u8);
                delta = 0;
            } else {
                self.metrics.packets_stale.fetch_add(1, Relaxed);
                tracing::debug!(
                    group_seq = hdr.group_seq,
                    start_seq = self.start_seq,
                    "dropping packet before window"
                );
                return Ok(InsertStatus::DroppedStale);
            }
        } else if delta as usize >= cap - 1 {
            self.metrics.packets_overflow.fetch_add(1, Relaxed);
            tracing::debug!(
                group_seq = hdr.group_seq,
                start_seq = self.start_seq,
                window = self.len(),
                "dropping packet beyond window"
            );
            return Ok(InsertStatus::DroppedOverflow);
        }

        let slot = (self.start + delta as usize) % cap;
        let mut group = match self.slots[slot].take() {
            Some(group) => {
                if !group.matches(hdr) {
                    let expected = group.seq();
                    self.slots[slot] = Some(group);
                    self.metrics.sequence_mismatches.fetch_add(1, Relaxed);
                    return Err(FecError::SequenceMismatch {
                        expected,
                        found: hdr.group_seq,
                    });
                }
                group
            }
            None => {
                let group = FecGroup::new(hdr)?;
                self.occupied += 1;
                self.metrics.groups_started.fetch_add(1, Relaxed);
                group
            }
        };

        let outcome = group.insert(hdr.share_index as usize, pkt.payload);
        let recovered = group.recovered_count();
        self.slots[slot] = Some(group);

        // Pull the end cursor past the touched slot, keeping the slot at
        // `end` empty.
        if delta as usize >= self.len() {
            self.end = (slot + 1) % cap;
        }

        match outcome {
            Ok(InsertOutcome::Inserted) => Ok(InsertStatus::Inserted),
            Ok(InsertOutcome::Duplicate) => {
                self.metrics.packets_duplicate.fetch_add(1, Relaxed);
                Ok(InsertStatus::Duplicate)
            }
            Ok(InsertOutcome::Completed) => {
                self.metrics.groups_decoded.fetch_add(1, Relaxed);
                self.metrics.shares_recovered.fetch_add(recovered as u64, Relaxed);
                Ok(InsertStatus::GroupCompleted)
            }
            Ok(InsertOutcome::Pending) => Ok(InsertStatus::DecodePending),
            Err(FecError::DecodeFailed(_)) => {
                self.metrics.groups_failed.fetch_add(1, Relaxed);
                Ok(InsertStatus::GroupFailed)
            }
            Err(e) => Err(e),
        }
    }

    /// The oldest group still in the window, skipping leading gap slots.
    pub fn first(&self) -> Option<&FecGroup> {
        let cap = self.capacity();
        let mut i = self.start;
        while i != self.end {
            if let Some(group) = &self.slots[i] {
                return Some(group);
            }
            i = (i + 1) % cap;
        }
        None
    }

    /// Remove the group at the front of the window and hand it to the
    /// caller, advancing the window one sequence number. Returns `None`
    /// for an empty buffer; a `Some(None)`-like gap slot yields `None` for
    /// the group but still advances, so repeated pops walk the window.
    pub fn pop(&mut self) -> Option<FecGroup> {
        if self.start == self.end {
            return None;
        }
        let group = self.slots[self.start].take();
        self.start = (self.start + 1) % self.capacity();
        self.start_seq = self.start_seq.wrapping_add(1);
        if let Some(g) = &group {
            self.occupied -= 1;
            if !g.is_decoded() {
                self.metrics.groups_evicted.fetch_add(1, Relaxed);
            }
        }
        group
    }

    /// Drop every group and reset the window.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.start = 0;
        self.end = 0;
        self.occupied = 0;
        self.anchored = false;
    }
}
