//! # framebridge - Shared-Memory Bridge Between a Game Client and an External Renderer
//!
//! framebridge connects a game client and a renderer running in a separate
//! process through one named shared memory region. No locks cross the process
//! boundary: every channel is coordinated with atomic flags and counters.
//!
//! ## Features
//!
//! - **Double-buffered frames**: scene and UI payloads handed over without tearing
//! - **Input queue**: fixed-capacity SPSC ring, newest event dropped when full
//! - **Camera channel**: latest-wins pose written by the client
//! - **Resolution channels**: one per direction, acknowledged by the peer
//! - **Versioned layout**: magic and version checked on attach, bounds-checked access
//! - **Role claims**: one live client and one live renderer per region
//! - **C API**: opaque handles for hosts that are not written in Rust
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐                       ┌──────────────────┐
//! │   Game client    │                       │     Renderer     │
//! │  ClientBridge    │                       │  RendererBridge  │
//! └────────┬─────────┘                       └─────────┬────────┘
//!          │        ┌─────────────────────────┐        │
//!          └───────▶│  preamble │ camera      │◀───────┘
//!                   │  resolution x2          │
//!                   │  frame headers x2       │
//!                   │  scene/UI buffers x2    │
//!                   │  input queue (256)      │
//!                   └─────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use framebridge::{BridgeConfig, ClientBridge};
//!
//! # fn main() -> framebridge::Result<()> {
//! let mut client = ClientBridge::init(&BridgeConfig::new("game"))?;
//! client.set_resolution(1920, 1080)?;
//! client.publish_frame(b"scene", &[0u8; 16])?;
//! while let Some(event) = client.poll_input()? {
//!     println!("{:?}", event);
//! }
//! client.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod channels;
pub mod error;
pub mod frames;
pub mod input;
pub mod layout;
pub mod memory;
pub mod sync;

#[cfg(feature = "c-api")]
pub mod ffi;

pub use bridge::{
    Attachment, BridgeConfig, ClientBridge, ClientEndpoints, RendererBridge, RendererEndpoints,
    Role,
};
pub use channels::{
    CameraReader, CameraState, CameraWriter, Resolution, ResolutionReader, ResolutionSide,
    ResolutionState, ResolutionWriter,
};
pub use error::{BridgeError, OpenErrorKind, Result};
pub use frames::{
    ConsumerStats, FrameConsumer, FrameGuard, FrameHeader, FrameProducer, ProducerStats,
};
pub use input::{InputConsumer, InputEvent, InputKind, InputProducer};
pub use layout::{BridgeRegion, RegionView};
pub use memory::{BackingType, RegionConfig, RegionMetadata, SharedMemoryRegion};
pub use sync::{Backoff, WaitPolicy};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 1;
pub const VERSION_PATCH: u32 = 0;
