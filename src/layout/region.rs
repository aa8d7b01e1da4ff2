//! Schema-aware handle over the mapped bridge region

use std::sync::{atomic::Ordering, Arc};

use log::{debug, trace, warn};

use crate::{
    channels::{self, CameraState, ResolutionSide, ResolutionState},
    error::{BridgeError, Result},
    frames::FrameHeader,
    memory::SharedMemoryRegion,
    sync::{Backoff, WaitPolicy},
};

use super::{constants::*, view::RegionView};

/// A mapped region known to carry the version-1 bridge layout
#[derive(Debug)]
pub struct BridgeRegion {
    view: RegionView,
}

impl BridgeRegion {
    /// Attach to a mapping, initialising it when this is the first attacher
    ///
    /// A concurrent attacher that loses the initialisation race waits for the
    /// winner under `init_wait` before validating. If the winner never
    /// finishes (it died mid-way), the waiter initialises the region itself;
    /// an unbounded `init_wait` is capped at the default timeout for this.
    pub fn attach(region: Arc<SharedMemoryRegion>, init_wait: &WaitPolicy) -> Result<Self> {
        if region.size() < LAYOUT_SIZE {
            return Err(BridgeError::RegionTooSmall {
                required: LAYOUT_SIZE,
                actual: region.size(),
            });
        }

        let bridge = Self {
            view: RegionView::new(region)?,
        };

        match bridge
            .view
            .compare_exchange_u32(MAGIC_OFFSET, 0, INITIALIZING_MAGIC)?
        {
            Ok(_) => bridge.initialize()?,
            Err(INITIALIZING_MAGIC) => bridge.await_initialization(init_wait)?,
            Err(_) => {}
        }

        bridge.validate()?;
        Ok(bridge)
    }

    fn initialize(&self) -> Result<()> {
        let view = &self.view;
        debug!("initialising bridge layout in '{}'", view.region().name());

        view.store_u32(VERSION_OFFSET, LAYOUT_VERSION, Ordering::Relaxed)?;
        view.store_u32(ACTIVE_INDEX_OFFSET, 0, Ordering::Relaxed)?;
        view.store_u32(ROLE_CLAIMS_OFFSET, 0, Ordering::Relaxed)?;
        view.zero(CAMERA_OFFSET, CAMERA_SIZE)?;

        for offset in [CLIENT_RESOLUTION_OFFSET, RENDERER_RESOLUTION_OFFSET] {
            view.store_u32(offset + RESOLUTION_WIDTH, 0, Ordering::Relaxed)?;
            view.store_u32(offset + RESOLUTION_HEIGHT, 0, Ordering::Relaxed)?;
            view.store_flag(offset + RESOLUTION_CONSUMED, true, Ordering::Relaxed)?;
        }

        for slot in 0..BUFFER_COUNT {
            let header = frame_header_offset(slot);
            view.store_flag(header + HEADER_READY, false, Ordering::Relaxed)?;
            view.store_flag(header + HEADER_CONSUMED, true, Ordering::Relaxed)?;
            view.store_u32(header + HEADER_FRAME_ID, 0, Ordering::Relaxed)?;
            view.store_u32(header + HEADER_SCENE_LENGTH, 0, Ordering::Relaxed)?;
            view.store_u32(header + HEADER_UI_LENGTH, 0, Ordering::Relaxed)?;
        }

        view.store_u32(INPUT_QUEUE_OFFSET + QUEUE_HEAD, 0, Ordering::Relaxed)?;
        view.store_u32(INPUT_QUEUE_OFFSET + QUEUE_TAIL, 0, Ordering::Relaxed)?;
        view.zero(
            INPUT_QUEUE_OFFSET + QUEUE_EVENTS,
            INPUT_QUEUE_CAPACITY * INPUT_EVENT_SIZE,
        )?;

        // Publishing the magic releases every field above.
        view.store_u32(MAGIC_OFFSET, BRIDGE_MAGIC, Ordering::Release)
    }

    fn await_initialization(&self, policy: &WaitPolicy) -> Result<()> {
        let policy = match policy.timeout {
            Some(_) => *policy,
            None => (*policy).with_timeout(WaitPolicy::default().timeout),
        };
        let mut backoff = Backoff::new(&policy);
        loop {
            let magic = self.view.load_u32(MAGIC_OFFSET, Ordering::Acquire)?;
            if magic != INITIALIZING_MAGIC {
                return Ok(());
            }
            if let Err(elapsed) = backoff.snooze() {
                warn!(
                    "initialisation of '{}' abandoned for {:?}, taking over",
                    self.name(),
                    elapsed.0
                );
                return self.initialize();
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let magic = self.view.load_u32(MAGIC_OFFSET, Ordering::Acquire)?;
        if magic != BRIDGE_MAGIC {
            return Err(BridgeError::layout_mismatch("magic", BRIDGE_MAGIC, magic));
        }
        let version = self.view.load_u32(VERSION_OFFSET, Ordering::Relaxed)?;
        if version != LAYOUT_VERSION {
            return Err(BridgeError::layout_mismatch(
                "version",
                LAYOUT_VERSION,
                version,
            ));
        }
        trace!("validated bridge layout v{}", version);
        Ok(())
    }

    /// Checked field access
    pub fn view(&self) -> &RegionView {
        &self.view
    }

    /// Name of the underlying region
    pub fn name(&self) -> &str {
        self.view.region().name()
    }

    /// Slot the producer most recently published into
    pub fn active_index(&self) -> Result<usize> {
        let index = self.view.load_u32(ACTIVE_INDEX_OFFSET, Ordering::Acquire)? as usize;
        if index >= BUFFER_COUNT {
            return Err(BridgeError::layout_mismatch(
                "active_index",
                (BUFFER_COUNT - 1) as u32,
                index as u32,
            ));
        }
        Ok(index)
    }

    pub(crate) fn set_active_index(&self, index: usize) -> Result<()> {
        self.view
            .store_u32(ACTIVE_INDEX_OFFSET, index as u32, Ordering::Release)
    }

    /// Clear the state a previous client session left behind
    ///
    /// Pending frames are dropped (both slots handed back to the producer),
    /// queued input is discarded and both resolution records read as
    /// handled. Frame ids are kept so numbering keeps increasing for a
    /// renderer that outlives the old client. Only fields the client owns
    /// or acknowledges as reader are written: the queue is emptied by
    /// advancing `tail` to `head`.
    pub(crate) fn reset_client_state(&self) -> Result<()> {
        let view = &self.view;
        debug!("resetting client state of '{}'", self.name());

        for slot in 0..BUFFER_COUNT {
            let header = frame_header_offset(slot);
            view.store_flag(header + HEADER_CONSUMED, true, Ordering::Release)?;
            view.store_flag(header + HEADER_READY, false, Ordering::Release)?;
        }

        let head = view.load_u32(INPUT_QUEUE_OFFSET + QUEUE_HEAD, Ordering::Acquire)?;
        view.store_u32(INPUT_QUEUE_OFFSET + QUEUE_TAIL, head, Ordering::Release)?;

        view.zero(CAMERA_OFFSET, CAMERA_SIZE)?;
        view.store_u32(CLIENT_RESOLUTION_OFFSET + RESOLUTION_WIDTH, 0, Ordering::Relaxed)?;
        view.store_u32(CLIENT_RESOLUTION_OFFSET + RESOLUTION_HEIGHT, 0, Ordering::Relaxed)?;
        view.store_flag(
            CLIENT_RESOLUTION_OFFSET + RESOLUTION_CONSUMED,
            true,
            Ordering::Release,
        )?;
        view.store_flag(
            RENDERER_RESOLUTION_OFFSET + RESOLUTION_CONSUMED,
            true,
            Ordering::Release,
        )
    }

    /// Current camera pose, read without binding a role
    pub fn camera(&self) -> Result<CameraState> {
        channels::camera::load_camera(self)
    }

    /// Current contents of one side's resolution record, without acknowledging it
    pub fn resolution_state(&self, side: ResolutionSide) -> Result<ResolutionState> {
        channels::resolution::load_state(self, side)
    }

    /// Raw bit set of claimed roles
    pub fn role_claims(&self) -> Result<u32> {
        self.view.load_u32(ROLE_CLAIMS_OFFSET, Ordering::Acquire)
    }

    /// Forget every role claim
    ///
    /// Only for recovery once the processes that held them are gone; a live
    /// holder keeps writing regardless.
    pub fn clear_role_claims(&self) -> Result<()> {
        self.view.store_u32(ROLE_CLAIMS_OFFSET, 0, Ordering::Release)
    }

    /// Snapshot a frame header for diagnostics
    ///
    /// The fields are loaded one by one; a snapshot taken while the producer
    /// is publishing may mix two frames.
    pub fn frame_header(&self, slot: usize) -> Result<FrameHeader> {
        if slot >= BUFFER_COUNT {
            return Err(BridgeError::invalid_parameter(
                "slot",
                format!("Frame slot {} out of range", slot),
            ));
        }
        let base = frame_header_offset(slot);
        Ok(FrameHeader {
            ready: self.view.load_flag(base + HEADER_READY, Ordering::Acquire)?,
            consumed: self.view.load_flag(base + HEADER_CONSUMED, Ordering::Acquire)?,
            frame_id: self.view.load_u32(base + HEADER_FRAME_ID, Ordering::Relaxed)?,
            scene_length: self
                .view
                .load_u32(base + HEADER_SCENE_LENGTH, Ordering::Relaxed)?,
            ui_length: self.view.load_u32(base + HEADER_UI_LENGTH, Ordering::Relaxed)?,
        })
    }

    /// Number of input events waiting in the queue
    pub fn input_queue_depth(&self) -> Result<usize> {
        let head = self
            .view
            .load_u32(INPUT_QUEUE_OFFSET + QUEUE_HEAD, Ordering::Acquire)?;
        let tail = self
            .view
            .load_u32(INPUT_QUEUE_OFFSET + QUEUE_TAIL, Ordering::Acquire)?;
        Ok(head.wrapping_sub(tail) as usize)
    }
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;
    use crate::memory::{BackingType, RegionConfig};

    fn mapping() -> Arc<SharedMemoryRegion> {
        let config = RegionConfig::new("layout").with_backing_type(BackingType::MemFd);
        Arc::new(SharedMemoryRegion::open(&config).unwrap())
    }

    #[test]
    fn test_fresh_region_is_initialised() {
        let region = BridgeRegion::attach(mapping(), &WaitPolicy::default()).unwrap();
        assert_eq!(region.active_index().unwrap(), 0);
        for slot in 0..BUFFER_COUNT {
            let header = region.frame_header(slot).unwrap();
            assert!(!header.ready);
            assert!(header.consumed);
            assert_eq!(header.frame_id, 0);
        }
        assert_eq!(region.input_queue_depth().unwrap(), 0);
    }

    #[test]
    fn test_second_attach_keeps_state() {
        let mapping = mapping();
        let first = BridgeRegion::attach(mapping.clone(), &WaitPolicy::default()).unwrap();
        first.set_active_index(1).unwrap();

        let second = BridgeRegion::attach(mapping, &WaitPolicy::default()).unwrap();
        assert_eq!(second.active_index().unwrap(), 1);
    }

    #[test]
    fn test_foreign_magic_rejected() {
        let mapping = mapping();
        unsafe {
            std::ptr::copy_nonoverlapping(b"JUNK".as_ptr(), mapping.base_ptr(), 4);
        }
        let err = BridgeRegion::attach(mapping, &WaitPolicy::default()).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::LayoutMismatch { field: "magic", .. }
        ));
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mapping = mapping();
        let region = BridgeRegion::attach(mapping.clone(), &WaitPolicy::default()).unwrap();
        region
            .view()
            .store_u32(VERSION_OFFSET, LAYOUT_VERSION + 1, Ordering::Relaxed)
            .unwrap();

        let err = BridgeRegion::attach(mapping, &WaitPolicy::default()).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::LayoutMismatch { field: "version", .. }
        ));
    }

    #[test]
    fn test_abandoned_initialisation_is_taken_over() {
        let mapping = mapping();
        unsafe {
            std::ptr::copy_nonoverlapping(
                INITIALIZING_MAGIC.to_le_bytes().as_ptr(),
                mapping.base_ptr(),
                4,
            );
        }
        let policy = WaitPolicy::default().with_timeout(Some(std::time::Duration::from_millis(5)));
        let region = BridgeRegion::attach(mapping, &policy).unwrap();
        assert_eq!(
            region.view().load_u32(MAGIC_OFFSET, Ordering::Acquire).unwrap(),
            BRIDGE_MAGIC
        );
        assert_eq!(region.active_index().unwrap(), 0);
    }

    #[test]
    fn test_client_reset_keeps_frame_ids() {
        let region = BridgeRegion::attach(mapping(), &WaitPolicy::default()).unwrap();
        let view = region.view();
        let header = frame_header_offset(1);
        view.store_u32(header + HEADER_FRAME_ID, 9, Ordering::Relaxed).unwrap();
        view.store_flag(header + HEADER_CONSUMED, false, Ordering::Release).unwrap();
        view.store_flag(header + HEADER_READY, true, Ordering::Release).unwrap();
        view.store_u32(INPUT_QUEUE_OFFSET + QUEUE_HEAD, 3, Ordering::Release).unwrap();
        view.store_flag(
            RENDERER_RESOLUTION_OFFSET + RESOLUTION_CONSUMED,
            false,
            Ordering::Release,
        )
        .unwrap();

        region.reset_client_state().unwrap();

        let reset = region.frame_header(1).unwrap();
        assert!(!reset.ready);
        assert!(reset.consumed);
        assert_eq!(reset.frame_id, 9);
        assert_eq!(region.input_queue_depth().unwrap(), 0);
        assert!(region
            .resolution_state(ResolutionSide::Renderer)
            .unwrap()
            .consumed);
    }
}
