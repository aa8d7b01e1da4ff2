//! Consumer side of the double-buffered frame exchange

use std::sync::{atomic::Ordering, Arc};

use log::{trace, warn};

use crate::{
    error::{BridgeError, Result},
    layout::{
        frame_header_offset, scene_offset, ui_offset, BridgeRegion, BUFFER_COUNT,
        HEADER_CONSUMED, HEADER_FRAME_ID, HEADER_READY, HEADER_SCENE_LENGTH, HEADER_UI_LENGTH,
        MAX_SCENE_SIZE, MAX_UI_SIZE,
    },
};

use super::header::{is_newer, FrameHeader};

/// Counters kept by the consumer for its own process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub frames_consumed: u64,
    /// Older frames released unread because a newer one was already active
    pub frames_skipped: u64,
}

/// The single reader of the frame slots
#[derive(Debug)]
pub struct FrameConsumer {
    region: Arc<BridgeRegion>,
    last_frame_id: Option<u32>,
    stats: ConsumerStats,
}

impl FrameConsumer {
    pub(crate) fn new(region: Arc<BridgeRegion>) -> Self {
        Self {
            region,
            last_frame_id: None,
            stats: ConsumerStats::default(),
        }
    }

    /// Take the most recently published frame, if it has not been consumed
    ///
    /// The returned guard borrows the payload in place. The slot stays owned
    /// by this consumer, and the producer cannot overwrite it, until the
    /// guard is dropped.
    pub fn try_acquire(&mut self) -> Result<Option<FrameGuard<'_>>> {
        let slot = self.region.active_index()?;
        let view = self.region.view();
        let base = frame_header_offset(slot);

        // Acquiring `consumed == false` makes the producer's payload visible.
        if view.load_flag(base + HEADER_CONSUMED, Ordering::Acquire)? {
            return Ok(None);
        }
        if !view.load_flag(base + HEADER_READY, Ordering::Acquire)? {
            return Ok(None);
        }

        let header = FrameHeader {
            ready: true,
            consumed: false,
            frame_id: view.load_u32(base + HEADER_FRAME_ID, Ordering::Relaxed)?,
            scene_length: view.load_u32(base + HEADER_SCENE_LENGTH, Ordering::Relaxed)?,
            ui_length: view.load_u32(base + HEADER_UI_LENGTH, Ordering::Relaxed)?,
        };

        if header.scene_length as usize > MAX_SCENE_SIZE {
            self.release(slot)?;
            return Err(BridgeError::oversized(
                "scene",
                header.scene_length as usize,
                MAX_SCENE_SIZE,
            ));
        }
        if header.ui_length as usize > MAX_UI_SIZE {
            self.release(slot)?;
            return Err(BridgeError::oversized(
                "ui",
                header.ui_length as usize,
                MAX_UI_SIZE,
            ));
        }

        if let Some(last) = self.last_frame_id {
            if !is_newer(header.frame_id, last) {
                warn!(
                    "slot {} holds frame {} which is not newer than consumed frame {}",
                    slot, header.frame_id, last
                );
                self.release(slot)?;
                return Ok(None);
            }
        }

        self.release_stale(slot, header.frame_id)?;

        Ok(Some(FrameGuard {
            consumer: self,
            slot,
            header,
        }))
    }

    /// Copy the newest unconsumed frame out and release its slot immediately
    pub fn consume_into(
        &mut self,
        scene: &mut Vec<u8>,
        ui: &mut Vec<u8>,
    ) -> Result<Option<FrameHeader>> {
        match self.try_acquire()? {
            Some(frame) => {
                scene.clear();
                scene.extend_from_slice(frame.scene()?);
                ui.clear();
                ui.extend_from_slice(frame.ui()?);
                Ok(Some(frame.finish()?))
            }
            None => Ok(None),
        }
    }

    /// Release the other slot if it still holds an older unread frame
    ///
    /// While that slot reads `consumed == false` the producer is blocked on
    /// it, so its header cannot change underneath this check.
    fn release_stale(&mut self, active: usize, active_id: u32) -> Result<()> {
        let other = (active + 1) % BUFFER_COUNT;
        let view = self.region.view();
        let base = frame_header_offset(other);

        if view.load_flag(base + HEADER_CONSUMED, Ordering::Acquire)?
            || !view.load_flag(base + HEADER_READY, Ordering::Acquire)?
        {
            return Ok(());
        }

        let other_id = view.load_u32(base + HEADER_FRAME_ID, Ordering::Relaxed)?;
        if is_newer(active_id, other_id) {
            trace!("skipping frame {} in slot {}", other_id, other);
            self.release(other)?;
            self.stats.frames_skipped += 1;
        }
        Ok(())
    }

    fn release(&self, slot: usize) -> Result<()> {
        self.region.view().store_flag(
            frame_header_offset(slot) + HEADER_CONSUMED,
            true,
            Ordering::Release,
        )
    }

    /// Id of the last frame this consumer released after reading
    pub fn last_frame_id(&self) -> Option<u32> {
        self.last_frame_id
    }

    pub fn stats(&self) -> ConsumerStats {
        self.stats
    }
}

/// An acquired frame; dropping it hands the slot back to the producer
#[derive(Debug)]
pub struct FrameGuard<'a> {
    consumer: &'a mut FrameConsumer,
    slot: usize,
    header: FrameHeader,
}

impl<'a> FrameGuard<'a> {
    /// Header as read when the frame was acquired
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn frame_id(&self) -> u32 {
        self.header.frame_id
    }

    /// Scene payload, borrowed from shared memory
    pub fn scene(&self) -> Result<&[u8]> {
        // The slot reads consumed == false until this guard drops.
        unsafe {
            self.consumer
                .region
                .view()
                .bytes(scene_offset(self.slot), self.header.scene_length as usize)
        }
    }

    /// UI payload, borrowed from shared memory
    pub fn ui(&self) -> Result<&[u8]> {
        unsafe {
            self.consumer
                .region
                .view()
                .bytes(ui_offset(self.slot), self.header.ui_length as usize)
        }
    }

    /// Release the slot, reporting any failure to do so
    pub fn finish(mut self) -> Result<FrameHeader> {
        let header = self.complete()?;
        std::mem::forget(self);
        Ok(header)
    }

    fn complete(&mut self) -> Result<FrameHeader> {
        self.consumer.release(self.slot)?;
        self.consumer.last_frame_id = Some(self.header.frame_id);
        self.consumer.stats.frames_consumed += 1;
        Ok(FrameHeader {
            consumed: true,
            ..self.header
        })
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.complete() {
            warn!("failed to release frame slot {}: {}", self.slot, e);
        }
    }
}
