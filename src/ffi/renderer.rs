//! FFI functions for the renderer side

use std::ptr::null_mut;

use log::{debug, warn};

use crate::{bridge::RendererBridge, error::Result, frames::FrameHeader, input::InputEvent};

use super::{
    types::{
        FbBridgeConfig, FbCameraState, FbErrorCode, FbFrameInfo, FbInputEvent, FbRendererHandle,
        FbResolution,
    },
    utils::{convert_bridge_config, init_logging, lock, registry, status},
};

fn with_renderer<T>(
    handle: FbRendererHandle,
    f: impl FnOnce(&mut RendererBridge) -> Result<T>,
) -> std::result::Result<T, FbErrorCode> {
    if handle.is_null() {
        return Err(FbErrorCode::InvalidParameter);
    }
    let session = registry()
        .get_renderer(handle as usize)
        .ok_or(FbErrorCode::StaleHandle)?;
    let mut renderer = lock(&session);
    f(&mut *renderer).map_err(|e| {
        debug!("renderer call failed: {}", e);
        FbErrorCode::from(e)
    })
}

enum Copied {
    Nothing,
    TooSmall(FrameHeader),
    Frame(FrameHeader),
}

/// Attach to an existing region and start a renderer session
#[no_mangle]
pub extern "C" fn framebridge_renderer_init(
    config: *const FbBridgeConfig,
    handle: *mut FbRendererHandle,
) -> FbErrorCode {
    init_logging();

    if config.is_null() || handle.is_null() {
        return FbErrorCode::InvalidParameter;
    }
    unsafe { *handle = null_mut() };

    let config = match convert_bridge_config(unsafe { &*config }) {
        Ok(config) => config,
        Err(e) => return e.into(),
    };

    match RendererBridge::init(&config) {
        Ok(renderer) => {
            let id = registry().store_renderer(renderer);
            unsafe { *handle = id as FbRendererHandle };
            FbErrorCode::Success
        }
        Err(e) => {
            warn!("renderer init for '{}' failed: {}", config.region.name, e);
            e.into()
        }
    }
}

/// End a renderer session; unknown or null handles are accepted
#[no_mangle]
pub extern "C" fn framebridge_renderer_shutdown(handle: FbRendererHandle) -> FbErrorCode {
    if handle.is_null() {
        return FbErrorCode::Success;
    }
    let session = registry().remove_renderer(handle as usize);
    if let Some(session) = session {
        lock(&session).shutdown();
    }
    FbErrorCode::Success
}

#[no_mangle]
pub extern "C" fn framebridge_renderer_get_camera(
    handle: FbRendererHandle,
    camera: *mut FbCameraState,
) -> FbErrorCode {
    if camera.is_null() {
        return FbErrorCode::InvalidParameter;
    }
    match with_renderer(handle, |renderer| renderer.camera()) {
        Ok(state) => {
            unsafe { *camera = state.into() };
            FbErrorCode::Success
        }
        Err(code) => code,
    }
}

/// Copy the newest frame into caller buffers and release its slot
///
/// Returns `Empty` when no new frame is published. If either buffer is too
/// small the frame is released uncopied, `info` still receives its lengths
/// and `BufferTooSmall` is returned.
#[no_mangle]
pub extern "C" fn framebridge_renderer_consume_frame(
    handle: FbRendererHandle,
    scene: *mut u8,
    scene_capacity: usize,
    ui: *mut u8,
    ui_capacity: usize,
    info: *mut FbFrameInfo,
) -> FbErrorCode {
    if (scene.is_null() && scene_capacity > 0) || (ui.is_null() && ui_capacity > 0) {
        return FbErrorCode::InvalidParameter;
    }

    let copied = with_renderer(handle, |renderer| {
        let frame = match renderer.acquire_frame()? {
            Some(frame) => frame,
            None => return Ok(Copied::Nothing),
        };
        let header = *frame.header();
        if header.scene_length as usize > scene_capacity || header.ui_length as usize > ui_capacity
        {
            return Ok(Copied::TooSmall(header));
        }

        let (scene_bytes, ui_bytes) = (frame.scene()?, frame.ui()?);
        unsafe {
            if !scene_bytes.is_empty() {
                std::ptr::copy_nonoverlapping(scene_bytes.as_ptr(), scene, scene_bytes.len());
            }
            if !ui_bytes.is_empty() {
                std::ptr::copy_nonoverlapping(ui_bytes.as_ptr(), ui, ui_bytes.len());
            }
        }
        Ok(Copied::Frame(frame.finish()?))
    });

    let (code, header) = match copied {
        Ok(Copied::Nothing) => return FbErrorCode::Empty,
        Ok(Copied::TooSmall(header)) => (FbErrorCode::BufferTooSmall, header),
        Ok(Copied::Frame(header)) => (FbErrorCode::Success, header),
        Err(code) => return code,
    };
    if !info.is_null() {
        unsafe { *info = header.into() };
    }
    code
}

/// Queue an input event; `QueueFull` means it was dropped
#[no_mangle]
pub extern "C" fn framebridge_renderer_push_input(
    handle: FbRendererHandle,
    event: *const FbInputEvent,
) -> FbErrorCode {
    if event.is_null() {
        return FbErrorCode::InvalidParameter;
    }
    let event = match InputEvent::try_from(unsafe { *event }) {
        Ok(event) => event,
        Err(e) => return e.into(),
    };
    status(with_renderer(handle, |renderer| renderer.try_push_input(&event)))
}

#[no_mangle]
pub extern "C" fn framebridge_renderer_dropped_input_events(
    handle: FbRendererHandle,
    dropped: *mut u64,
) -> FbErrorCode {
    if dropped.is_null() {
        return FbErrorCode::InvalidParameter;
    }
    match with_renderer(handle, |renderer| renderer.dropped_input_events()) {
        Ok(count) => {
            unsafe { *dropped = count };
            FbErrorCode::Success
        }
        Err(code) => code,
    }
}

#[no_mangle]
pub extern "C" fn framebridge_renderer_set_resolution(
    handle: FbRendererHandle,
    width: u32,
    height: u32,
) -> FbErrorCode {
    status(with_renderer(handle, |renderer| {
        renderer.set_resolution(width, height)
    }))
}

/// Take a client resolution change, returning `Empty` when there is none
#[no_mangle]
pub extern "C" fn framebridge_renderer_peer_resolution(
    handle: FbRendererHandle,
    resolution: *mut FbResolution,
) -> FbErrorCode {
    if resolution.is_null() {
        return FbErrorCode::InvalidParameter;
    }
    match with_renderer(handle, |renderer| renderer.peer_resolution()) {
        Ok(Some(taken)) => {
            unsafe { *resolution = taken.into() };
            FbErrorCode::Success
        }
        Ok(None) => FbErrorCode::Empty,
        Err(code) => code,
    }
}
