//! Transport-level diagnostic counters.
//!
//! The receive path never fails hard on network weather; it counts. A
//! `TransportMetrics` is the caller-supplied sink the group buffer reports
//! drops, duplicates and recoveries into. All writes are Relaxed — these
//! are sampling counters, not synchronization.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::sync::Arc;

#[derive(Default)]
pub struct TransportMetrics {
    /// Packets offered to the group buffer.
    pub packets_received: AtomicU64,
    /// Headers that failed validation (bad index or geometry).
    pub packets_malformed: AtomicU64,
    /// Re-deliveries of an already-present share.
    pub packets_duplicate: AtomicU64,
    /// Dropped: group sequence before the window, beyond backward growth.
    pub packets_stale: AtomicU64,
    /// Dropped: group sequence beyond the forward edge of the window.
    pub packets_overflow: AtomicU64,
    /// Packets whose parameters disagreed with an open group.
    pub sequence_mismatches: AtomicU64,

    pub groups_started: AtomicU64,
    pub groups_decoded: AtomicU64,
    /// Groups that exhausted all n shares without decoding.
    pub groups_failed: AtomicU64,
    /// Undecoded groups discarded by `pop`.
    pub groups_evicted: AtomicU64,
    /// Data shares rebuilt from parity.
    pub shares_recovered: AtomicU64,
}

impl TransportMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshot(&self) -> TransportMetricsSnapshot {
        TransportMetricsSnapshot {
            packets_received: self.packets_received.load(Relaxed),
            packets_malformed: self.packets_malformed.load(Relaxed),
            packets_duplicate: self.packets_duplicate.load(Relaxed),
            packets_stale: self.packets_stale.load(Relaxed),
            packets_overflow: self.packets_overflow.load(Relaxed),
            sequence_mismatches: self.sequence_mismatches.load(Relaxed),
            groups_started: self.groups_started.load(Relaxed),
            groups_decoded: self.groups_decoded.load(Relaxed),
            groups_failed: self.groups_failed.load(Relaxed),
            groups_evicted: self.groups_evicted.load(Relaxed),
            shares_recovered: self.shares_recovered.load(Relaxed),
        }
    }
}

/// Plain point-in-time copy for display and reporting.
#[derive(Debug, Clone, Serialize)]
pub struct TransportMetricsSnapshot {
    pub packets_received: u64,
    pub packets_malformed: u64,
    pub packets_duplicate: u64,
    pub packets_stale: u64,
    pub packets_overflow: u64,
    pub sequence_mismatches: u64,
    pub groups_started: u64,
    pub groups_decoded: u64,
    pub groups_failed: u64,
    pub groups_evicted: u64,
    pub shares_recovered: u64,
}
