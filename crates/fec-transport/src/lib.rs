//! Forward-error-correction for real-time packet transport.
//!
//! A systematic Reed-Solomon erasure code over GF(2^8) plus the stateful
//! machinery that reassembles coding groups from an unreliable, reordering
//! packet stream: any k of a group's n shares recover the original k
//! payloads. The sender side batches payloads through [`GroupEncoder`];
//! the receiver parses datagrams with [`CodedPacket::parse`] and feeds
//! them into a [`GroupBuffer`], polling decoded groups off the front.

pub mod clock;
pub mod codec;
pub mod encoder;
pub mod error;
pub mod gf;
pub mod group;
pub mod group_buffer;
pub mod matrix;
pub mod metrics;
pub mod packet;

pub use codec::FecCodec;
pub use encoder::GroupEncoder;
pub use error::FecError;
pub use group::{FecGroup, InsertOutcome};
pub use group_buffer::{GroupBuffer, InsertStatus};
pub use metrics::{TransportMetrics, TransportMetricsSnapshot};
pub use packet::{CodedPacket, PacketHeader, HEADER_SIZE, MAX_PAYLOAD_SIZE, PACKET_MAGIC};
