//! FFI functions for the game client side

use std::ptr::null_mut;

use log::{debug, warn};

use crate::{bridge::ClientBridge, channels::CameraState, error::Result};

use super::{
    types::{
        FbBridgeConfig, FbCameraState, FbClientHandle, FbErrorCode, FbFrameInfo, FbInputEvent,
        FbResolution,
    },
    utils::{convert_bridge_config, init_logging, lock, registry, status},
};

/// Run `f` against the live session behind `handle`
fn with_client<T>(
    handle: FbClientHandle,
    f: impl FnOnce(&mut ClientBridge) -> Result<T>,
) -> std::result::Result<T, FbErrorCode> {
    if handle.is_null() {
        return Err(FbErrorCode::InvalidParameter);
    }
    let session = registry()
        .get_client(handle as usize)
        .ok_or(FbErrorCode::StaleHandle)?;
    let mut client = lock(&session);
    f(&mut *client).map_err(|e| {
        debug!("client call failed: {}", e);
        FbErrorCode::from(e)
    })
}

/// Borrow a caller buffer; a zero length accepts a null pointer
unsafe fn input_slice<'a>(
    ptr: *const u8,
    len: usize,
) -> std::result::Result<&'a [u8], FbErrorCode> {
    if len == 0 {
        Ok(&[])
    } else if ptr.is_null() {
        Err(FbErrorCode::InvalidParameter)
    } else {
        Ok(std::slice::from_raw_parts(ptr, len))
    }
}

/// Open (or create) the region and start a client session
#[no_mangle]
pub extern "C" fn framebridge_client_init(
    config: *const FbBridgeConfig,
    handle: *mut FbClientHandle,
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

    match ClientBridge::init(&config) {
        Ok(client) => {
            let id = registry().store_client(client);
            unsafe { *handle = id as FbClientHandle };
            FbErrorCode::Success
        }
        Err(e) => {
            warn!("client init for '{}' failed: {}", config.region.name, e);
            e.into()
        }
    }
}

/// End a client session; unknown or null handles are accepted
#[no_mangle]
pub extern "C" fn framebridge_client_shutdown(handle: FbClientHandle) -> FbErrorCode {
    if handle.is_null() {
        return FbErrorCode::Success;
    }
    let session = registry().remove_client(handle as usize);
    if let Some(session) = session {
        lock(&session).shutdown();
    }
    FbErrorCode::Success
}

#[no_mangle]
pub extern "C" fn framebridge_client_set_camera(
    handle: FbClientHandle,
    camera: *const FbCameraState,
) -> FbErrorCode {
    if camera.is_null() {
        return FbErrorCode::InvalidParameter;
    }
    let camera = CameraState::from(unsafe { *camera });
    status(with_client(handle, |client| client.set_camera(&camera)))
}

/// Publish one frame; `info` may be null
///
/// Blocks until the renderer frees a slot or the session's timeout expires.
#[no_mangle]
pub extern "C" fn framebridge_client_publish_frame(
    handle: FbClientHandle,
    scene: *const u8,
    scene_len: usize,
    ui: *const u8,
    ui_len: usize,
    info: *mut FbFrameInfo,
) -> FbErrorCode {
    let (scene, ui) = match unsafe { (input_slice(scene, scene_len), input_slice(ui, ui_len)) } {
        (Ok(scene), Ok(ui)) => (scene, ui),
        _ => return FbErrorCode::InvalidParameter,
    };

    match with_client(handle, |client| client.publish_frame(scene, ui)) {
        Ok(header) => {
            if !info.is_null() {
                unsafe { *info = header.into() };
            }
            FbErrorCode::Success
        }
        Err(code) => code,
    }
}

/// Dequeue one input event, returning `Empty` when none is waiting
#[no_mangle]
pub extern "C" fn framebridge_client_poll_input(
    handle: FbClientHandle,
    event: *mut FbInputEvent,
) -> FbErrorCode {
    if event.is_null() {
        return FbErrorCode::InvalidParameter;
    }
    match with_client(handle, |client| client.poll_input()) {
        Ok(Some(polled)) => {
            unsafe { *event = polled.into() };
            FbErrorCode::Success
        }
        Ok(None) => FbErrorCode::Empty,
        Err(code) => code,
    }
}

#[no_mangle]
pub extern "C" fn framebridge_client_set_resolution(
    handle: FbClientHandle,
    width: u32,
    height: u32,
) -> FbErrorCode {
    status(with_client(handle, |client| client.set_resolution(width, height)))
}

/// Take a renderer resolution change, returning `Empty` when there is none
#[no_mangle]
pub extern "C" fn framebridge_client_peer_resolution(
    handle: FbClientHandle,
    resolution: *mut FbResolution,
) -> FbErrorCode {
    if resolution.is_null() {
        return FbErrorCode::InvalidParameter;
    }
    match with_client(handle, |client| client.peer_resolution()) {
        Ok(Some(taken)) => {
            unsafe { *resolution = taken.into() };
            FbErrorCode::Success
        }
        Ok(None) => FbErrorCode::Empty,
        Err(code) => code,
    }
}
