//! Error taxonomy for the FEC transport.
//!
//! Two families: adverse-network conditions (malformed packets, stale or
//! out-of-window arrivals) that callers drop and count, and consistency
//! faults (bad codec parameters, singular matrices, sequence mismatches on
//! an open group) that indicate a programming error or corrupted peer and
//! should be surfaced. Nothing in this crate aborts the process.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FecError {
    /// Codec parameters outside 1 ≤ k ≤ n ≤ 256, or call geometry
    /// (row counts, buffer sizes) inconsistent with them.
    #[error("invalid codec parameters: k={k}, n={n}")]
    InvalidParameters { k: usize, n: usize },

    /// Gauss-Jordan found no usable pivot; the decode-matrix rows were
    /// linearly dependent. Not expected from a correctly built generator.
    #[error("singular matrix")]
    SingularMatrix,

    /// Vandermonde inversion has no unique construction for k = 1.
    #[error("degenerate vandermonde matrix")]
    DegenerateMatrix,

    /// Wire parse failure: short buffer, bad magic, or a payload length
    /// that disagrees with the buffer.
    #[error("malformed packet: {0}")]
    MalformedPacket(&'static str),

    /// A share index at or beyond the group's n.
    #[error("share index {index} out of range for n={n}")]
    ShareIndexOutOfRange { index: usize, n: usize },

    /// A packet's group parameters disagree with the group already open at
    /// its window position.
    #[error("group sequence mismatch: slot holds {expected}, packet has {found}")]
    SequenceMismatch { expected: u8, found: u8 },

    /// The group window cannot accommodate the packet's position.
    #[error("group buffer exhausted")]
    BufferExhausted,

    /// Reconstruction failed: fewer than k usable shares, or conflicting
    /// share placements.
    #[error("decode failed: {0}")]
    DecodeFailed(&'static str),
}
