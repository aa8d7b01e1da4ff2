//! FFI version and layout information

use std::ffi::c_char;

use crate::layout::{LAYOUT_SIZE, LAYOUT_VERSION, MAX_SCENE_SIZE, MAX_UI_SIZE};

use super::utils::string_to_c_str;

#[no_mangle]
pub extern "C" fn framebridge_version_major() -> u32 {
    crate::VERSION_MAJOR
}

#[no_mangle]
pub extern "C" fn framebridge_version_minor() -> u32 {
    crate::VERSION_MINOR
}

#[no_mangle]
pub extern "C" fn framebridge_version_patch() -> u32 {
    crate::VERSION_PATCH
}

/// Get version string (caller must free with framebridge_free_string)
#[no_mangle]
pub extern "C" fn framebridge_version_string() -> *mut c_char {
    string_to_c_str(crate::VERSION.to_string())
}

/// Shared memory layout version this build reads and writes
#[no_mangle]
pub extern "C" fn framebridge_layout_version() -> u32 {
    LAYOUT_VERSION
}

/// Total region size in bytes
#[no_mangle]
pub extern "C" fn framebridge_layout_size() -> usize {
    LAYOUT_SIZE
}

/// Largest scene payload per frame
#[no_mangle]
pub extern "C" fn framebridge_max_scene_size() -> usize {
    MAX_SCENE_SIZE
}

/// Largest UI payload per frame
#[no_mangle]
pub extern "C" fn framebridge_max_ui_size() -> usize {
    MAX_UI_SIZE
}
