//! Byte offsets and capacities of the bridge layout, version 1
//!
//! ```text
//! 0       preamble      magic, version, active index, role claims
//! 16      camera        6 x f32
//! 40      resolution    client:   width, height, consumed + pad
//! 52      resolution    renderer: width, height, consumed + pad
//! 64      frame header  slot 0: ready, consumed, pad, frame id, scene len, ui len
//! 80      frame header  slot 1
//! 96      scene buffers 2 x MAX_SCENE_SIZE
//! ...     ui buffers    2 x MAX_UI_SIZE
//! ...     input queue   head, tail, INPUT_QUEUE_CAPACITY x 20-byte records
//! ```
//!
//! Every multi-byte field is little-endian. Changing anything here requires
//! bumping [`LAYOUT_VERSION`].

/// "FBRG" when read as little-endian bytes
pub const BRIDGE_MAGIC: u32 = 0x4752_4246;

/// Placeholder magic held while the first attacher initialises the region
pub const INITIALIZING_MAGIC: u32 = 0xFFFF_FFFF;

pub const LAYOUT_VERSION: u32 = 1;

/// Number of frame slots
pub const BUFFER_COUNT: usize = 2;

/// Maximum scene payload per slot (8 MiB)
pub const MAX_SCENE_SIZE: usize = 8 * 1024 * 1024;

/// Maximum UI payload per slot (3840x2160 RGBA)
pub const MAX_UI_SIZE: usize = 3840 * 2160 * 4;

pub const INPUT_QUEUE_CAPACITY: usize = 256;

// Preamble
pub const MAGIC_OFFSET: usize = 0;
pub const VERSION_OFFSET: usize = 4;
pub const ACTIVE_INDEX_OFFSET: usize = 8;
/// Bit set of roles currently bound by a live session
pub const ROLE_CLAIMS_OFFSET: usize = 12;
pub const PREAMBLE_SIZE: usize = 16;

// Camera
pub const CAMERA_OFFSET: usize = PREAMBLE_SIZE;
pub const CAMERA_FIELD_COUNT: usize = 6;
pub const CAMERA_SIZE: usize = CAMERA_FIELD_COUNT * 4;

// Resolution records
pub const RESOLUTION_WIDTH: usize = 0;
pub const RESOLUTION_HEIGHT: usize = 4;
pub const RESOLUTION_CONSUMED: usize = 8;
pub const RESOLUTION_SIZE: usize = 12;
pub const CLIENT_RESOLUTION_OFFSET: usize = CAMERA_OFFSET + CAMERA_SIZE;
pub const RENDERER_RESOLUTION_OFFSET: usize = CLIENT_RESOLUTION_OFFSET + RESOLUTION_SIZE;

// Frame headers
pub const HEADER_READY: usize = 0;
pub const HEADER_CONSUMED: usize = 1;
pub const HEADER_FRAME_ID: usize = 4;
pub const HEADER_SCENE_LENGTH: usize = 8;
pub const HEADER_UI_LENGTH: usize = 12;
pub const FRAME_HEADER_SIZE: usize = 16;
pub const FRAME_HEADERS_OFFSET: usize = RENDERER_RESOLUTION_OFFSET + RESOLUTION_SIZE;

// Payload buffers
pub const SCENE_BUFFERS_OFFSET: usize = FRAME_HEADERS_OFFSET + BUFFER_COUNT * FRAME_HEADER_SIZE;
pub const UI_BUFFERS_OFFSET: usize = SCENE_BUFFERS_OFFSET + BUFFER_COUNT * MAX_SCENE_SIZE;

// Input queue
pub const QUEUE_HEAD: usize = 0;
pub const QUEUE_TAIL: usize = 4;
pub const QUEUE_EVENTS: usize = 8;
pub const EVENT_KIND: usize = 0;
pub const EVENT_KEY_CODE: usize = 4;
pub const EVENT_MOUSE_BUTTON: usize = 8;
pub const EVENT_MOUSE_X: usize = 12;
pub const EVENT_MOUSE_Y: usize = 16;
pub const INPUT_EVENT_SIZE: usize = 20;
pub const INPUT_QUEUE_OFFSET: usize = UI_BUFFERS_OFFSET + BUFFER_COUNT * MAX_UI_SIZE;
pub const INPUT_QUEUE_SIZE: usize = QUEUE_EVENTS + INPUT_QUEUE_CAPACITY * INPUT_EVENT_SIZE;

/// Total bytes a mapping must provide
pub const LAYOUT_SIZE: usize = INPUT_QUEUE_OFFSET + INPUT_QUEUE_SIZE;

const _: () = assert!(FRAME_HEADERS_OFFSET % 4 == 0);
const _: () = assert!(SCENE_BUFFERS_OFFSET == 96);
const _: () = assert!(INPUT_QUEUE_OFFSET % 4 == 0);
const _: () = assert!(INPUT_QUEUE_CAPACITY.is_power_of_two());

/// Offset of the header for `slot`
pub const fn frame_header_offset(slot: usize) -> usize {
    FRAME_HEADERS_OFFSET + slot * FRAME_HEADER_SIZE
}

/// Offset of the scene buffer for `slot`
pub const fn scene_offset(slot: usize) -> usize {
    SCENE_BUFFERS_OFFSET + slot * MAX_SCENE_SIZE
}

/// Offset of the UI buffer for `slot`
pub const fn ui_offset(slot: usize) -> usize {
    UI_BUFFERS_OFFSET + slot * MAX_UI_SIZE
}

/// Offset of the ring record that `counter` maps to
pub const fn input_event_offset(counter: u32) -> usize {
    INPUT_QUEUE_OFFSET
        + QUEUE_EVENTS
        + (counter as usize & (INPUT_QUEUE_CAPACITY - 1)) * INPUT_EVENT_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_offsets() {
        assert_eq!(CAMERA_OFFSET, 16);
        assert_eq!(CLIENT_RESOLUTION_OFFSET, 40);
        assert_eq!(RENDERER_RESOLUTION_OFFSET, 52);
        assert_eq!(frame_header_offset(0), 64);
        assert_eq!(frame_header_offset(1), 80);
        assert_eq!(scene_offset(1), 96 + MAX_SCENE_SIZE);
        assert_eq!(ui_offset(0), 96 + 2 * MAX_SCENE_SIZE);
        assert_eq!(INPUT_QUEUE_SIZE, 8 + 256 * 20);
        assert_eq!(LAYOUT_SIZE, INPUT_QUEUE_OFFSET + INPUT_QUEUE_SIZE);
    }

    #[test]
    fn test_event_offsets_wrap() {
        assert_eq!(input_event_offset(0), INPUT_QUEUE_OFFSET + 8);
        assert_eq!(input_event_offset(256), input_event_offset(0));
        assert_eq!(input_event_offset(u32::MAX), input_event_offset(255));
    }

    #[test]
    fn test_magic_bytes() {
        assert_eq!(&BRIDGE_MAGIC.to_le_bytes(), b"FBRG");
    }
}
