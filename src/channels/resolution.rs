//! Single-value resolution channels, one per direction
//!
//! The owning side writes `(width, height)` and clears `consumed`; the peer
//! notices, applies the size and sets `consumed` again. Nothing queues: a
//! burst of writes before the peer looks collapses to the last one.

use std::sync::{atomic::Ordering, Arc};

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    layout::{
        BridgeRegion, CLIENT_RESOLUTION_OFFSET, RENDERER_RESOLUTION_OFFSET, RESOLUTION_CONSUMED,
        RESOLUTION_HEIGHT, RESOLUTION_WIDTH,
    },
};

/// Window size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// RGBA byte count of a full frame at this size
    pub fn rgba_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Current contents of a resolution record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolutionState {
    pub resolution: Resolution,
    /// The peer has acted on `resolution`
    pub consumed: bool,
}

/// Which side owns a resolution record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionSide {
    Client,
    Renderer,
}

impl ResolutionSide {
    fn offset(self) -> usize {
        match self {
            ResolutionSide::Client => CLIENT_RESOLUTION_OFFSET,
            ResolutionSide::Renderer => RENDERER_RESOLUTION_OFFSET,
        }
    }
}

pub(crate) fn load_state(region: &BridgeRegion, side: ResolutionSide) -> Result<ResolutionState> {
    let view = region.view();
    let base = side.offset();
    let consumed = view.load_flag(base + RESOLUTION_CONSUMED, Ordering::Acquire)?;
    Ok(ResolutionState {
        resolution: Resolution {
            width: view.load_u32(base + RESOLUTION_WIDTH, Ordering::Relaxed)?,
            height: view.load_u32(base + RESOLUTION_HEIGHT, Ordering::Relaxed)?,
        },
        consumed,
    })
}

/// The owning side's handle: publishes its own window size
#[derive(Debug)]
pub struct ResolutionWriter {
    region: Arc<BridgeRegion>,
    side: ResolutionSide,
}

impl ResolutionWriter {
    pub(crate) fn new(region: Arc<BridgeRegion>, side: ResolutionSide) -> Self {
        Self { region, side }
    }

    /// Announce a new size to the peer
    pub fn publish(&mut self, resolution: Resolution) -> Result<()> {
        let view = self.region.view();
        let base = self.side.offset();
        view.store_u32(base + RESOLUTION_WIDTH, resolution.width, Ordering::Relaxed)?;
        view.store_u32(base + RESOLUTION_HEIGHT, resolution.height, Ordering::Relaxed)?;
        view.store_flag(base + RESOLUTION_CONSUMED, false, Ordering::Release)
    }

    /// Last published size and whether the peer has picked it up
    pub fn state(&self) -> Result<ResolutionState> {
        load_state(&self.region, self.side)
    }

    pub fn side(&self) -> ResolutionSide {
        self.side
    }
}

/// The peer's handle: observes and acknowledges the owner's size
#[derive(Debug)]
pub struct ResolutionReader {
    region: Arc<BridgeRegion>,
    side: ResolutionSide,
}

impl ResolutionReader {
    pub(crate) fn new(region: Arc<BridgeRegion>, side: ResolutionSide) -> Self {
        Self { region, side }
    }

    /// Take a pending size, acknowledging it in the same step
    ///
    /// The flag is set before the size is read and checked again after. A
    /// publish that finished in between left the flag cleared, so the read
    /// is repeated to return the newer pair. A publish still writing while
    /// the size is read can yield a width and height from different calls;
    /// that publish clears the flag when it completes, so the next call
    /// returns its complete pair.
    pub fn take(&mut self) -> Result<Option<Resolution>> {
        let view = self.region.view();
        let base = self.side.offset();
        if view.load_flag(base + RESOLUTION_CONSUMED, Ordering::Acquire)? {
            return Ok(None);
        }
        if view.swap_flag(base + RESOLUTION_CONSUMED, true, Ordering::AcqRel)? {
            return Ok(None);
        }
        loop {
            let resolution = Resolution {
                width: view.load_u32(base + RESOLUTION_WIDTH, Ordering::Relaxed)?,
                height: view.load_u32(base + RESOLUTION_HEIGHT, Ordering::Relaxed)?,
            };
            if view.load_flag(base + RESOLUTION_CONSUMED, Ordering::Acquire)? {
                return Ok(Some(resolution));
            }
            // Overwritten mid-read; claim the newer value instead.
            view.swap_flag(base + RESOLUTION_CONSUMED, true, Ordering::AcqRel)?;
        }
    }

    /// Read without acknowledging
    pub fn peek(&self) -> Result<ResolutionState> {
        load_state(&self.region, self.side)
    }

    /// Mark the current value as handled without reading it
    pub fn acknowledge(&mut self) -> Result<()> {
        self.region.view().store_flag(
            self.side.offset() + RESOLUTION_CONSUMED,
            true,
            Ordering::Release,
        )
    }

    pub fn side(&self) -> ResolutionSide {
        self.side
    }
}
