//! Versioned binary layout of the bridge region
//!
//! The region is treated as a wire format: fixed offsets, little-endian
//! fields, and a magic/version preamble both processes validate on attach.
//! Higher layers never compute offsets themselves.

pub mod constants;
pub mod region;
pub mod view;

pub use constants::*;
pub use region::BridgeRegion;
pub use view::RegionView;
