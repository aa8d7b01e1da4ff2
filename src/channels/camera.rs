//! Latest-wins camera channel, written by the client

use std::sync::{atomic::Ordering, Arc};

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    layout::{BridgeRegion, CAMERA_OFFSET},
};

/// Camera position, orientation and zoom
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub zoom: f32,
}

impl CameraState {
    pub fn new(x: f32, y: f32, z: f32, yaw: f32, pitch: f32, zoom: f32) -> Self {
        Self {
            x,
            y,
            z,
            yaw,
            pitch,
            zoom,
        }
    }

    fn fields(&self) -> [f32; 6] {
        [self.x, self.y, self.z, self.yaw, self.pitch, self.zoom]
    }

    fn from_fields(fields: [f32; 6]) -> Self {
        let [x, y, z, yaw, pitch, zoom] = fields;
        Self::new(x, y, z, yaw, pitch, zoom)
    }
}

/// The client's handle on the camera channel
///
/// Each call rewrites all six fields, but not as one atomic unit: a reader
/// racing a write can observe some fields from the previous call.
#[derive(Debug)]
pub struct CameraWriter {
    region: Arc<BridgeRegion>,
}

impl CameraWriter {
    pub(crate) fn new(region: Arc<BridgeRegion>) -> Self {
        Self { region }
    }

    pub fn set(&mut self, state: &CameraState) -> Result<()> {
        let view = self.region.view();
        for (i, value) in state.fields().into_iter().enumerate() {
            view.store_f32(CAMERA_OFFSET + i * 4, value, Ordering::Release)?;
        }
        Ok(())
    }
}

/// The renderer's handle on the camera channel
#[derive(Debug)]
pub struct CameraReader {
    region: Arc<BridgeRegion>,
}

impl CameraReader {
    pub(crate) fn new(region: Arc<BridgeRegion>) -> Self {
        Self { region }
    }

    /// Read the latest camera state; may be torn across two writes
    pub fn get(&self) -> Result<CameraState> {
        load_camera(&self.region)
    }
}

pub(crate) fn load_camera(region: &BridgeRegion) -> Result<CameraState> {
    let view = region.view();
    let mut fields = [0f32; 6];
    for (i, field) in fields.iter_mut().enumerate() {
        *field = view.load_f32(CAMERA_OFFSET + i * 4, Ordering::Acquire)?;
    }
    Ok(CameraState::from_fields(fields))
}
