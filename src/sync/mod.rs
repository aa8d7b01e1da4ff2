//! Waiting primitives for cross-process handoff
//!
//! Nothing here blocks on an OS object shared with the peer; every wait is a
//! poll of shared memory flags with an escalating backoff.

pub mod wait;

pub use wait::{Backoff, Elapsed, WaitPolicy};
