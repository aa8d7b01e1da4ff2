//! Shared memory region opening and mapping

pub mod config;
pub mod regions;

pub use config::{BackingType, RegionConfig};
pub use regions::{RegionMetadata, SharedMemoryRegion};
