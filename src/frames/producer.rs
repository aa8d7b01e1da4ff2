//! Producer side of the double-buffered frame exchange

use std::sync::{atomic::Ordering, Arc};

use log::{trace, warn};

use crate::{
    error::{BridgeError, Result},
    layout::{
        frame_header_offset, scene_offset, ui_offset, BridgeRegion, BUFFER_COUNT,
        HEADER_CONSUMED, HEADER_FRAME_ID, HEADER_READY, HEADER_SCENE_LENGTH, HEADER_UI_LENGTH,
        MAX_SCENE_SIZE, MAX_UI_SIZE,
    },
    sync::{Backoff, WaitPolicy},
};

use super::header::{is_newer, FrameHeader};

/// Counters kept by the producer for its own process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerStats {
    pub frames_published: u64,
    /// Publishes that had to wait for the consumer
    pub stalls: u64,
    pub timeouts: u64,
}

/// The single writer of the frame slots
#[derive(Debug)]
pub struct FrameProducer {
    region: Arc<BridgeRegion>,
    wait: WaitPolicy,
    next_frame_id: u32,
    stats: ProducerStats,
}

impl FrameProducer {
    pub(crate) fn new(region: Arc<BridgeRegion>, wait: WaitPolicy) -> Result<Self> {
        // Continue numbering after whatever a previous producer left behind.
        let mut newest = 0u32;
        for slot in 0..BUFFER_COUNT {
            let id = region.frame_header(slot)?.frame_id;
            if id != 0 && (newest == 0 || is_newer(id, newest)) {
                newest = id;
            }
        }

        Ok(Self {
            region,
            wait,
            next_frame_id: Self::successor(newest),
            stats: ProducerStats::default(),
        })
    }

    fn successor(id: u32) -> u32 {
        match id.wrapping_add(1) {
            0 => 1,
            next => next,
        }
    }

    /// Publish one frame into the non-active slot
    ///
    /// Waits under the configured [`WaitPolicy`] while the consumer still
    /// holds that slot. Oversized payloads are rejected before anything is
    /// written.
    pub fn publish(&mut self, scene: &[u8], ui: &[u8]) -> Result<FrameHeader> {
        if scene.len() > MAX_SCENE_SIZE {
            return Err(BridgeError::oversized("scene", scene.len(), MAX_SCENE_SIZE));
        }
        if ui.len() > MAX_UI_SIZE {
            return Err(BridgeError::oversized("ui", ui.len(), MAX_UI_SIZE));
        }

        let active = self.region.active_index()?;
        let slot = (active + 1) % BUFFER_COUNT;
        self.wait_for_slot(slot)?;

        let view = self.region.view();
        let header = frame_header_offset(slot);
        let frame_id = self.next_frame_id;

        view.write_bytes(scene_offset(slot), scene)?;
        view.write_bytes(ui_offset(slot), ui)?;
        view.store_u32(header + HEADER_FRAME_ID, frame_id, Ordering::Relaxed)?;
        view.store_u32(header + HEADER_SCENE_LENGTH, scene.len() as u32, Ordering::Relaxed)?;
        view.store_u32(header + HEADER_UI_LENGTH, ui.len() as u32, Ordering::Relaxed)?;

        // Payload and lengths become visible to a consumer that acquires either flag.
        view.store_flag(header + HEADER_CONSUMED, false, Ordering::Release)?;
        view.store_flag(header + HEADER_READY, true, Ordering::Release)?;
        self.region.set_active_index(slot)?;

        self.next_frame_id = Self::successor(frame_id);
        self.stats.frames_published += 1;
        trace!(
            "published frame {} into slot {} ({} + {} bytes)",
            frame_id,
            slot,
            scene.len(),
            ui.len()
        );

        Ok(FrameHeader {
            ready: true,
            consumed: false,
            frame_id,
            scene_length: scene.len() as u32,
            ui_length: ui.len() as u32,
        })
    }

    fn wait_for_slot(&mut self, slot: usize) -> Result<()> {
        let view = self.region.view();
        let header = frame_header_offset(slot);
        let mut backoff = Backoff::new(&self.wait);
        let mut stalled = false;

        loop {
            let consumed = view.load_flag(header + HEADER_CONSUMED, Ordering::Acquire)?;
            let ready = view.load_flag(header + HEADER_READY, Ordering::Acquire)?;
            if consumed || !ready {
                if stalled {
                    self.stats.stalls += 1;
                }
                return Ok(());
            }

            stalled = true;
            if let Err(elapsed) = backoff.snooze() {
                self.stats.timeouts += 1;
                warn!(
                    "frame slot {} still held by consumer after {:?}",
                    slot, elapsed.0
                );
                return Err(BridgeError::ConsumerTimeout {
                    slot,
                    waited_ms: elapsed.0.as_millis() as u64,
                });
            }
        }
    }

    /// Id the next publish will carry
    pub fn next_frame_id(&self) -> u32 {
        self.next_frame_id
    }

    pub fn wait_policy(&self) -> &WaitPolicy {
        &self.wait
    }

    pub fn stats(&self) -> ProducerStats {
        self.stats
    }
}
