//! C Foreign Function Interface (FFI) for game engines and renderers
//!
//! Sessions are handed out as opaque handles. Every function returns an
//! [`FbErrorCode`]; results are written through out-pointers.

pub mod client;
pub mod renderer;
pub mod types;
pub mod utils;
pub mod version;

pub use types::{
    FbBridgeConfig, FbCameraState, FbClientHandle, FbErrorCode, FbFrameInfo, FbInputEvent,
    FbRendererHandle, FbResolution,
};

pub use utils::{framebridge_free_string, framebridge_init_logging, HANDLE_REGISTRY};

// Client API
pub use client::{
    framebridge_client_init, framebridge_client_peer_resolution, framebridge_client_poll_input,
    framebridge_client_publish_frame, framebridge_client_set_camera,
    framebridge_client_set_resolution, framebridge_client_shutdown,
};

// Renderer API
pub use renderer::{
    framebridge_renderer_consume_frame, framebridge_renderer_dropped_input_events,
    framebridge_renderer_get_camera, framebridge_renderer_init,
    framebridge_renderer_peer_resolution, framebridge_renderer_push_input,
    framebridge_renderer_set_resolution, framebridge_renderer_shutdown,
};

// Version API
pub use version::{
    framebridge_layout_size, framebridge_layout_version, framebridge_max_scene_size,
    framebridge_max_ui_size, framebridge_version_major, framebridge_version_minor,
    framebridge_version_patch, framebridge_version_string,
};
