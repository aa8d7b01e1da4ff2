//! Single-producer single-consumer input ring in shared memory
//!
//! `head` and `tail` are free-running `u32` counters; a record lives at
//! `counter % INPUT_QUEUE_CAPACITY`. Empty is `head == tail`, full is
//! `head - tail == INPUT_QUEUE_CAPACITY`, both in wrapping arithmetic.

use std::sync::{atomic::Ordering, Arc};

use log::{debug, warn};

use crate::{
    error::{BridgeError, Result},
    layout::{
        input_event_offset, BridgeRegion, EVENT_KEY_CODE, EVENT_KIND, EVENT_MOUSE_BUTTON,
        EVENT_MOUSE_X, EVENT_MOUSE_Y, INPUT_QUEUE_CAPACITY, INPUT_QUEUE_OFFSET, QUEUE_HEAD,
        QUEUE_TAIL,
    },
};

use super::event::{InputEvent, InputKind};

const HEAD: usize = INPUT_QUEUE_OFFSET + QUEUE_HEAD;
const TAIL: usize = INPUT_QUEUE_OFFSET + QUEUE_TAIL;

/// Renderer-side handle: the only writer of `head`
#[derive(Debug)]
pub struct InputProducer {
    region: Arc<BridgeRegion>,
    pushed: u64,
    dropped: u64,
}

impl InputProducer {
    pub(crate) fn new(region: Arc<BridgeRegion>) -> Self {
        Self {
            region,
            pushed: 0,
            dropped: 0,
        }
    }

    /// Try to enqueue an event, failing with `QueueFull` when no slot is free
    pub fn try_push(&mut self, event: &InputEvent) -> Result<()> {
        let view = self.region.view();
        let head = view.load_u32(HEAD, Ordering::Relaxed)?;
        let tail = view.load_u32(TAIL, Ordering::Acquire)?;

        if head.wrapping_sub(tail) as usize >= INPUT_QUEUE_CAPACITY {
            self.dropped += 1;
            debug!(
                "input queue full, dropping {:?} ({} dropped so far)",
                event.kind, self.dropped
            );
            return Err(BridgeError::QueueFull {
                capacity: INPUT_QUEUE_CAPACITY,
            });
        }

        let record = input_event_offset(head);
        view.store_u32(record + EVENT_KIND, event.kind.tag(), Ordering::Relaxed)?;
        view.store_u32(record + EVENT_KEY_CODE, event.key_code, Ordering::Relaxed)?;
        view.store_u32(record + EVENT_MOUSE_BUTTON, event.mouse_button, Ordering::Relaxed)?;
        view.store_f32(record + EVENT_MOUSE_X, event.mouse_x, Ordering::Relaxed)?;
        view.store_f32(record + EVENT_MOUSE_Y, event.mouse_y, Ordering::Relaxed)?;

        view.store_u32(HEAD, head.wrapping_add(1), Ordering::Release)?;
        self.pushed += 1;
        Ok(())
    }

    /// Enqueue an event; `Ok(false)` means the queue was full and the event dropped
    ///
    /// Never blocks. Errors other than a full queue are propagated.
    pub fn push(&mut self, event: &InputEvent) -> Result<bool> {
        match self.try_push(event) {
            Ok(()) => Ok(true),
            Err(BridgeError::QueueFull { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Events dropped by this producer because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    /// Free slots as seen by the producer
    pub fn available_space(&self) -> Result<usize> {
        Ok(INPUT_QUEUE_CAPACITY - self.region.input_queue_depth()?)
    }
}

/// Client-side handle: the only writer of `tail`
#[derive(Debug)]
pub struct InputConsumer {
    region: Arc<BridgeRegion>,
    skipped: u64,
}

impl InputConsumer {
    pub(crate) fn new(region: Arc<BridgeRegion>) -> Self {
        Self { region, skipped: 0 }
    }

    /// Dequeue the oldest event, or `None` when the queue is empty
    ///
    /// Records with an unknown kind tag are discarded and the next one is
    /// tried.
    pub fn poll(&mut self) -> Result<Option<InputEvent>> {
        let view = self.region.view();
        loop {
            let tail = view.load_u32(TAIL, Ordering::Relaxed)?;
            let head = view.load_u32(HEAD, Ordering::Acquire)?;
            if head == tail {
                return Ok(None);
            }

            let record = input_event_offset(tail);
            let tag = view.load_u32(record + EVENT_KIND, Ordering::Relaxed)?;
            let event = match InputKind::from_tag(tag) {
                Some(kind) => Some(InputEvent {
                    kind,
                    key_code: view.load_u32(record + EVENT_KEY_CODE, Ordering::Relaxed)?,
                    mouse_button: view.load_u32(record + EVENT_MOUSE_BUTTON, Ordering::Relaxed)?,
                    mouse_x: view.load_f32(record + EVENT_MOUSE_X, Ordering::Relaxed)?,
                    mouse_y: view.load_f32(record + EVENT_MOUSE_Y, Ordering::Relaxed)?,
                }),
                None => None,
            };

            view.store_u32(TAIL, tail.wrapping_add(1), Ordering::Release)?;

            match event {
                Some(event) => return Ok(Some(event)),
                None => {
                    self.skipped += 1;
                    warn!("discarding input record with unknown kind tag {}", tag);
                }
            }
        }
    }

    /// Number of events waiting
    pub fn len(&self) -> Result<usize> {
        self.region.input_queue_depth()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Records discarded for carrying an unknown kind tag
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Iterate until the queue is empty
    ///
    /// Stops early, logging the error, if the region cannot be read.
    pub fn drain(&mut self) -> Drain<'_> {
        Drain { consumer: self }
    }
}

/// Iterator returned by [`InputConsumer::drain`]
#[derive(Debug)]
pub struct Drain<'a> {
    consumer: &'a mut InputConsumer,
}

impl Iterator for Drain<'_> {
    type Item = InputEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.consumer.poll() {
            Ok(event) => event,
            Err(e) => {
                warn!("input drain stopped: {}", e);
                None
            }
        }
    }
}
