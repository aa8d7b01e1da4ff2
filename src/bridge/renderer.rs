//! External renderer side of the bridge

use std::sync::Arc;

use log::{debug, info};

use crate::{
    channels::{
        CameraReader, CameraState, Resolution, ResolutionReader, ResolutionState, ResolutionWriter,
    },
    error::{BridgeError, Result},
    frames::{FrameConsumer, FrameGuard, FrameHeader},
    input::{InputEvent, InputProducer},
    layout::BridgeRegion,
};

use super::{claim::RoleClaim, Attachment, BridgeConfig};

/// Handles owned by the renderer
#[derive(Debug)]
pub struct RendererEndpoints {
    pub camera: CameraReader,
    pub frames: FrameConsumer,
    pub input: InputProducer,
    pub resolution: ResolutionWriter,
    pub peer_resolution: ResolutionReader,
    pub(crate) region: Arc<BridgeRegion>,
    pub(crate) _claim: RoleClaim,
}

impl RendererEndpoints {
    pub fn region(&self) -> &Arc<BridgeRegion> {
        &self.region
    }
}

/// A renderer session
#[derive(Debug)]
pub struct RendererBridge {
    name: String,
    endpoints: Option<RendererEndpoints>,
}

impl RendererBridge {
    /// Attach to a region the client has already created
    ///
    /// `config.region.create` is ignored: a missing region fails with
    /// `Open { kind: NotFound, .. }`.
    pub fn init(config: &BridgeConfig) -> Result<Self> {
        let config = config.clone().open_existing();
        let bridge = Self::from_attachment(Attachment::open(&config)?)?;
        info!("renderer bridge '{}' initialised", bridge.name);
        Ok(bridge)
    }

    pub fn from_attachment(attachment: Attachment) -> Result<Self> {
        let name = attachment.region().name().to_string();
        Ok(Self {
            name,
            endpoints: Some(attachment.into_renderer()?),
        })
    }

    /// Detach from the region; calling it again does nothing
    pub fn shutdown(&mut self) {
        if let Some(endpoints) = self.endpoints.take() {
            let dropped = endpoints.input.dropped();
            if dropped > 0 {
                debug!("renderer '{}' dropped {} input events", self.name, dropped);
            }
            info!("renderer bridge '{}' shut down", self.name);
        }
    }

    pub fn is_active(&self) -> bool {
        self.endpoints.is_some()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoints(&mut self) -> Result<&mut RendererEndpoints> {
        self.endpoints.as_mut().ok_or(BridgeError::StaleHandle)
    }

    pub fn camera(&mut self) -> Result<CameraState> {
        self.endpoints()?.camera.get()
    }

    /// Borrow the newest published frame; the slot is released when the guard drops
    pub fn acquire_frame(&mut self) -> Result<Option<FrameGuard<'_>>> {
        self.endpoints()?.frames.try_acquire()
    }

    /// Copy the newest published frame into caller buffers
    pub fn consume_frame_into(
        &mut self,
        scene: &mut Vec<u8>,
        ui: &mut Vec<u8>,
    ) -> Result<Option<FrameHeader>> {
        self.endpoints()?.frames.consume_into(scene, ui)
    }

    /// Queue an input event for the client; `Ok(false)` if it was dropped
    pub fn push_input(&mut self, event: &InputEvent) -> Result<bool> {
        self.endpoints()?.input.push(event)
    }

    pub fn try_push_input(&mut self, event: &InputEvent) -> Result<()> {
        self.endpoints()?.input.try_push(event)
    }

    pub fn dropped_input_events(&mut self) -> Result<u64> {
        Ok(self.endpoints()?.input.dropped())
    }

    /// Announce the renderer surface size to the client
    pub fn set_resolution(&mut self, width: u32, height: u32) -> Result<()> {
        self.endpoints()?
            .resolution
            .publish(Resolution::new(width, height))
    }

    pub fn resolution_state(&mut self) -> Result<ResolutionState> {
        self.endpoints()?.resolution.state()
    }

    /// Take a client resolution change that has not been handled yet
    pub fn peer_resolution(&mut self) -> Result<Option<Resolution>> {
        self.endpoints()?.peer_resolution.take()
    }

    pub fn peer_resolution_state(&mut self) -> Result<ResolutionState> {
        self.endpoints()?.peer_resolution.peek()
    }
}

impl Drop for RendererBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}
