//! Per-process facades over the shared region
//!
//! An [`Attachment`] is one process's view of the region. It is split exactly
//! once into the handle set for its role, so each channel ends up with one
//! writer handle and one reader handle. Binding a role also claims it in
//! the region, so a second client or renderer on the same region is refused
//! while the first one is live:
//!
//! ```text
//!              client                        renderer
//!   camera     CameraWriter      ──────▶     CameraReader
//!   frames     FrameProducer     ──────▶     FrameConsumer
//!   input      InputConsumer     ◀──────     InputProducer
//!   res(cli)   ResolutionWriter  ──────▶     ResolutionReader
//!   res(ren)   ResolutionReader  ◀──────     ResolutionWriter
//! ```

pub mod claim;
pub mod client;
pub mod config;
pub mod renderer;

use std::sync::Arc;

use log::debug;

use self::claim::RoleClaim;
use crate::{
    channels::{CameraReader, CameraWriter, ResolutionReader, ResolutionSide, ResolutionWriter},
    error::Result,
    frames::{FrameConsumer, FrameProducer},
    input::{InputConsumer, InputProducer},
    layout::BridgeRegion,
    memory::SharedMemoryRegion,
    sync::WaitPolicy,
};

pub use claim::Role;
pub use client::{ClientBridge, ClientEndpoints};
pub use config::BridgeConfig;
pub use renderer::{RendererBridge, RendererEndpoints};

/// A validated attachment to the bridge region, not yet bound to a role
#[derive(Debug)]
pub struct Attachment {
    region: Arc<BridgeRegion>,
    wait: WaitPolicy,
    reclaim: bool,
}

impl Attachment {
    /// Open the configured region and attach to it
    pub fn open(config: &BridgeConfig) -> Result<Self> {
        config.validate()?;
        let mapping = Arc::new(SharedMemoryRegion::open(&config.region)?);
        Ok(Self::from_mapping(mapping, config.wait)?.with_reclaim(config.reclaim))
    }

    /// Attach to an already mapped region
    ///
    /// Attaching twice to one mapping gives both roles to a single process,
    /// which is how loopback setups and tests run.
    pub fn from_mapping(mapping: Arc<SharedMemoryRegion>, wait: WaitPolicy) -> Result<Self> {
        let region = Arc::new(BridgeRegion::attach(mapping, &wait)?);
        debug!("attached to bridge region '{}'", region.name());
        Ok(Self {
            region,
            wait,
            reclaim: false,
        })
    }

    /// Take over a role even if the region records it as held
    ///
    /// For recovering after a process died without shutting down.
    pub fn with_reclaim(mut self, reclaim: bool) -> Self {
        self.reclaim = reclaim;
        self
    }

    /// The attached region, for diagnostics
    pub fn region(&self) -> &Arc<BridgeRegion> {
        &self.region
    }

    /// Bind this attachment to the game client role
    ///
    /// Starts a new client session: whatever a previous client left in the
    /// region (pending frames, queued input, unread resolutions) is cleared.
    pub fn into_client(self) -> Result<ClientEndpoints> {
        let region = self.region;
        let claim = RoleClaim::acquire(region.clone(), Role::Client, self.reclaim)?;
        region.reset_client_state()?;
        Ok(ClientEndpoints {
            camera: CameraWriter::new(region.clone()),
            frames: FrameProducer::new(region.clone(), self.wait)?,
            input: InputConsumer::new(region.clone()),
            resolution: ResolutionWriter::new(region.clone(), ResolutionSide::Client),
            peer_resolution: ResolutionReader::new(region.clone(), ResolutionSide::Renderer),
            region,
            _claim: claim,
        })
    }

    /// Bind this attachment to the external renderer role
    pub fn into_renderer(self) -> Result<RendererEndpoints> {
        let region = self.region;
        let claim = RoleClaim::acquire(region.clone(), Role::Renderer, self.reclaim)?;
        Ok(RendererEndpoints {
            camera: CameraReader::new(region.clone()),
            frames: FrameConsumer::new(region.clone()),
            input: InputProducer::new(region.clone()),
            resolution: ResolutionWriter::new(region.clone(), ResolutionSide::Renderer),
            peer_resolution: ResolutionReader::new(region.clone(), ResolutionSide::Client),
            region,
            _claim: claim,
        })
    }
}
