//! Game client side of the bridge

use std::sync::Arc;

use log::{debug, info};

use crate::{
    channels::{
        CameraState, CameraWriter, Resolution, ResolutionReader, ResolutionState, ResolutionWriter,
    },
    error::{BridgeError, Result},
    frames::{FrameHeader, FrameProducer},
    input::{InputConsumer, InputEvent},
    layout::BridgeRegion,
};

use super::{claim::RoleClaim, Attachment, BridgeConfig};

/// Handles owned by the game client
///
/// The client writes the camera, frames and its own resolution, and reads
/// input events and the renderer's resolution.
#[derive(Debug)]
pub struct ClientEndpoints {
    pub camera: CameraWriter,
    pub frames: FrameProducer,
    pub input: InputConsumer,
    pub resolution: ResolutionWriter,
    pub peer_resolution: ResolutionReader,
    pub(crate) region: Arc<BridgeRegion>,
    pub(crate) _claim: RoleClaim,
}

impl ClientEndpoints {
    pub fn region(&self) -> &Arc<BridgeRegion> {
        &self.region
    }
}

/// A client session: the endpoints plus a lifecycle
///
/// After [`shutdown`](ClientBridge::shutdown) every call fails with
/// [`BridgeError::StaleHandle`].
#[derive(Debug)]
pub struct ClientBridge {
    name: String,
    endpoints: Option<ClientEndpoints>,
}

impl ClientBridge {
    /// Open (creating if configured) and attach to the named region
    pub fn init(config: &BridgeConfig) -> Result<Self> {
        let bridge = Self::from_attachment(Attachment::open(config)?)?;
        info!("client bridge '{}' initialised", bridge.name);
        Ok(bridge)
    }

    pub fn from_attachment(attachment: Attachment) -> Result<Self> {
        let name = attachment.region().name().to_string();
        Ok(Self {
            name,
            endpoints: Some(attachment.into_client()?),
        })
    }

    /// Detach from the region; calling it again does nothing
    pub fn shutdown(&mut self) {
        if let Some(endpoints) = self.endpoints.take() {
            if let Err(e) = endpoints.region.view().region().flush() {
                debug!("flush on shutdown of '{}' failed: {}", self.name, e);
            }
            info!("client bridge '{}' shut down", self.name);
        }
    }

    pub fn is_active(&self) -> bool {
        self.endpoints.is_some()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoints(&mut self) -> Result<&mut ClientEndpoints> {
        self.endpoints.as_mut().ok_or(BridgeError::StaleHandle)
    }

    pub fn set_camera(&mut self, camera: &CameraState) -> Result<()> {
        self.endpoints()?.camera.set(camera)
    }

    /// Publish one frame, waiting for a free slot under the session's wait policy
    pub fn publish_frame(&mut self, scene: &[u8], ui: &[u8]) -> Result<FrameHeader> {
        self.endpoints()?.frames.publish(scene, ui)
    }

    pub fn poll_input(&mut self) -> Result<Option<InputEvent>> {
        self.endpoints()?.input.poll()
    }

    /// Announce the client window size to the renderer
    pub fn set_resolution(&mut self, width: u32, height: u32) -> Result<()> {
        self.endpoints()?
            .resolution
            .publish(Resolution::new(width, height))
    }

    /// The client's own record, including whether the renderer acknowledged it
    pub fn resolution_state(&mut self) -> Result<ResolutionState> {
        self.endpoints()?.resolution.state()
    }

    /// Take a renderer resolution change that has not been handled yet
    pub fn peer_resolution(&mut self) -> Result<Option<Resolution>> {
        self.endpoints()?.peer_resolution.take()
    }

    pub fn peer_resolution_state(&mut self) -> Result<ResolutionState> {
        self.endpoints()?.peer_resolution.peek()
    }

    pub fn frame_header(&mut self, slot: usize) -> Result<FrameHeader> {
        self.endpoints()?.region.frame_header(slot)
    }
}

impl Drop for ClientBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}
