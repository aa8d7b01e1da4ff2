//! Double-buffered frame publish/consume protocol
//!
//! Two slots, each a header plus scene and UI payload buffers. Ownership of
//! a slot is carried entirely by its `consumed` flag:
//!
//! - `consumed == true` (or never `ready`): the producer owns the slot and
//!   may rewrite it.
//! - `consumed == false`: the consumer owns it; the producer waits.
//!
//! The producer always writes the non-active slot, flips `consumed` then
//! `ready` with release ordering, and finally moves `active_index`. The
//! consumer acquires the active slot's flags before touching its payload.

pub mod consumer;
pub mod header;
pub mod producer;

pub use consumer::{ConsumerStats, FrameConsumer, FrameGuard};
pub use header::FrameHeader;
pub use producer::{FrameProducer, ProducerStats};
