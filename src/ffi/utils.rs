//! FFI utilities and handle management

use std::{
    collections::HashMap,
    ffi::{c_char, CStr, CString},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use crate::{
    bridge::{BridgeConfig, ClientBridge, RendererBridge},
    error::{BridgeError, Result},
    memory::{BackingType, RegionConfig},
    sync::WaitPolicy,
};

use super::types::{FbBridgeConfig, FbErrorCode};

// Global handle management
lazy_static::lazy_static! {
    pub static ref HANDLE_REGISTRY: Mutex<HandleRegistry> = Mutex::new(HandleRegistry::new());
}

/// Sessions owned on behalf of C callers, keyed by the id handed out as the handle
///
/// Each session sits behind its own mutex so a publish waiting on the
/// renderer does not hold the registry lock.
pub struct HandleRegistry {
    pub clients: HashMap<usize, Arc<Mutex<ClientBridge>>>,
    pub renderers: HashMap<usize, Arc<Mutex<RendererBridge>>>,
    pub next_id: usize,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
            renderers: HashMap::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn store_client(&mut self, client: ClientBridge) -> usize {
        let id = self.allocate_id();
        self.clients.insert(id, Arc::new(Mutex::new(client)));
        id
    }

    pub fn get_client(&self, id: usize) -> Option<Arc<Mutex<ClientBridge>>> {
        self.clients.get(&id).cloned()
    }

    pub fn remove_client(&mut self, id: usize) -> Option<Arc<Mutex<ClientBridge>>> {
        self.clients.remove(&id)
    }

    pub fn store_renderer(&mut self, renderer: RendererBridge) -> usize {
        let id = self.allocate_id();
        self.renderers.insert(id, Arc::new(Mutex::new(renderer)));
        id
    }

    pub fn get_renderer(&self, id: usize) -> Option<Arc<Mutex<RendererBridge>>> {
        self.renderers.get(&id).cloned()
    }

    pub fn remove_renderer(&mut self, id: usize) -> Option<Arc<Mutex<RendererBridge>>> {
        self.renderers.remove(&id)
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn registry() -> MutexGuard<'static, HandleRegistry> {
    lock(&HANDLE_REGISTRY)
}

/// Write `code` for a failed call, or `Success` for `Ok`
pub(crate) fn status(result: std::result::Result<(), FbErrorCode>) -> FbErrorCode {
    match result {
        Ok(()) => FbErrorCode::Success,
        Err(code) => code,
    }
}

/// Initialise `env_logger` once; later calls are no-ops
pub(crate) fn init_logging() {
    let _ = env_logger::try_init();
}

/// Convert C string to Rust String
pub fn c_str_to_string(c_str: *const c_char, parameter: &str) -> Result<String> {
    if c_str.is_null() {
        return Err(BridgeError::invalid_parameter(parameter, "null string"));
    }

    unsafe {
        CStr::from_ptr(c_str)
            .to_str()
            .map(|s| s.to_owned())
            .map_err(|e| BridgeError::invalid_parameter(parameter, e.to_string()))
    }
}

/// Convert Rust String to C string (caller must free with framebridge_free_string)
pub fn string_to_c_str(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c_string) => c_string.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Convert C session config to Rust config
pub(crate) fn convert_bridge_config(config: &FbBridgeConfig) -> Result<BridgeConfig> {
    let name = c_str_to_string(config.name, "name")?;

    let backing_type = match config.backing_type {
        0 => BackingType::FileBacked,
        #[cfg(target_os = "linux")]
        1 => BackingType::MemFd,
        other => {
            return Err(BridgeError::invalid_parameter(
                "backing_type",
                format!("unsupported backing type {}", other),
            ))
        }
    };

    let mut region = RegionConfig::new(name)
        .with_backing_type(backing_type)
        .with_create(config.create);
    if !config.file_path.is_null() {
        region = region.with_file_path(c_str_to_string(config.file_path, "file_path")?);
    }

    let timeout = match config.timeout_ms {
        0 => None,
        ms => Some(Duration::from_millis(ms)),
    };

    Ok(BridgeConfig::new(region.name.clone())
        .with_region(region)
        .with_wait_policy(WaitPolicy::default().with_timeout(timeout)))
}

/// Free a C string allocated by this library
#[no_mangle]
pub extern "C" fn framebridge_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}

/// Initialise logging from `RUST_LOG`; safe to call more than once
#[no_mangle]
pub extern "C" fn framebridge_init_logging() {
    init_logging();
}
