//! FFI type definitions and handle types

use std::ffi::{c_char, c_void};

use crate::{
    channels::{CameraState, Resolution},
    error::{BridgeError, OpenErrorKind},
    frames::FrameHeader,
    input::{InputEvent, InputKind},
};

/// Opaque handle types for C API
pub type FbClientHandle = *mut c_void;
pub type FbRendererHandle = *mut c_void;

/// Error codes for C API
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FbErrorCode {
    Success = 0,
    InvalidParameter = 1,
    NotFound = 2,
    PermissionDenied = 3,
    OpenFailed = 4,
    OversizedPayload = 5,
    QueueFull = 6,
    StaleHandle = 7,
    ConsumerTimeout = 8,
    LayoutMismatch = 9,
    RegionTooSmall = 10,
    IoError = 11,
    PlatformError = 12,
    /// Nothing to return: no pending event, frame or resolution change
    Empty = 13,
    /// The caller's buffer cannot hold the payload
    BufferTooSmall = 14,
    /// The role is already bound by another live session
    RoleInUse = 15,
    UnknownError = 99,
}

impl From<&BridgeError> for FbErrorCode {
    fn from(error: &BridgeError) -> Self {
        match error {
            BridgeError::Open { kind, .. } => match kind {
                OpenErrorKind::NotFound => FbErrorCode::NotFound,
                OpenErrorKind::PermissionDenied => FbErrorCode::PermissionDenied,
                OpenErrorKind::Other => FbErrorCode::OpenFailed,
            },
            BridgeError::Io { .. } => FbErrorCode::IoError,
            BridgeError::OversizedPayload { .. } => FbErrorCode::OversizedPayload,
            BridgeError::QueueFull { .. } => FbErrorCode::QueueFull,
            BridgeError::RoleInUse { .. } => FbErrorCode::RoleInUse,
            BridgeError::StaleHandle => FbErrorCode::StaleHandle,
            BridgeError::ConsumerTimeout { .. } => FbErrorCode::ConsumerTimeout,
            BridgeError::LayoutMismatch { .. } => FbErrorCode::LayoutMismatch,
            BridgeError::RegionTooSmall { .. } => FbErrorCode::RegionTooSmall,
            BridgeError::OutOfBounds { .. } => FbErrorCode::UnknownError,
            BridgeError::InvalidParameter { .. } => FbErrorCode::InvalidParameter,
            BridgeError::Platform { .. } => FbErrorCode::PlatformError,
        }
    }
}

impl From<BridgeError> for FbErrorCode {
    fn from(error: BridgeError) -> Self {
        FbErrorCode::from(&error)
    }
}

/// Session configuration (C-compatible)
#[repr(C)]
pub struct FbBridgeConfig {
    pub name: *const c_char,
    pub file_path: *const c_char, // NULL = default path
    pub backing_type: u32,        // 0 = FileBacked, 1 = MemFd
    pub create: bool,             // ignored by the renderer
    pub timeout_ms: u64,          // 0 = wait without limit
}

/// Camera pose
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FbCameraState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub zoom: f32,
}

impl From<CameraState> for FbCameraState {
    fn from(c: CameraState) -> Self {
        Self {
            x: c.x,
            y: c.y,
            z: c.z,
            yaw: c.yaw,
            pitch: c.pitch,
            zoom: c.zoom,
        }
    }
}

impl From<FbCameraState> for CameraState {
    fn from(c: FbCameraState) -> Self {
        CameraState::new(c.x, c.y, c.z, c.yaw, c.pitch, c.zoom)
    }
}

/// Input event, `kind` uses the shared-memory tag values
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FbInputEvent {
    pub kind: u32, // 0 = KeyDown, 1 = KeyUp, 2 = MouseDown, 3 = MouseUp, 4 = MouseMove
    pub key_code: u32,
    pub mouse_button: u32,
    pub mouse_x: f32,
    pub mouse_y: f32,
}

impl From<InputEvent> for FbInputEvent {
    fn from(e: InputEvent) -> Self {
        Self {
            kind: e.kind.tag(),
            key_code: e.key_code,
            mouse_button: e.mouse_button,
            mouse_x: e.mouse_x,
            mouse_y: e.mouse_y,
        }
    }
}

impl TryFrom<FbInputEvent> for InputEvent {
    type Error = BridgeError;

    fn try_from(e: FbInputEvent) -> Result<Self, Self::Error> {
        let kind = InputKind::from_tag(e.kind).ok_or_else(|| {
            BridgeError::invalid_parameter("kind", format!("unknown input kind {}", e.kind))
        })?;
        Ok(InputEvent {
            kind,
            key_code: e.key_code,
            mouse_button: e.mouse_button,
            mouse_x: e.mouse_x,
            mouse_y: e.mouse_y,
        })
    }
}

/// Window size in pixels
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FbResolution {
    pub width: u32,
    pub height: u32,
}

impl From<Resolution> for FbResolution {
    fn from(r: Resolution) -> Self {
        Self {
            width: r.width,
            height: r.height,
        }
    }
}

/// Header of a published or consumed frame
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FbFrameInfo {
    pub frame_id: u32,
    pub scene_length: u32,
    pub ui_length: u32,
}

impl From<FrameHeader> for FbFrameInfo {
    fn from(h: FrameHeader) -> Self {
        Self {
            frame_id: h.frame_id,
            scene_length: h.scene_length,
            ui_length: h.ui_length,
        }
    }
}
