//! Configuration types for opening shared memory regions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::layout::LAYOUT_SIZE;

/// Types of shared memory backing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackingType {
    /// File-backed shared memory, reachable by name from other processes
    FileBacked,
    /// Anonymous memory file descriptor (Linux-specific, same-process loopback only)
    #[cfg(target_os = "linux")]
    MemFd,
}

impl Default for BackingType {
    fn default() -> Self {
        Self::FileBacked
    }
}

impl BackingType {
    /// Get a human-readable name for the backing type
    pub fn name(&self) -> &'static str {
        match self {
            BackingType::FileBacked => "file-backed",
            #[cfg(target_os = "linux")]
            BackingType::MemFd => "memfd",
        }
    }
}

/// Configuration for opening the bridge region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Name both processes agree on
    pub name: String,
    /// Mapping size in bytes
    pub size: usize,
    /// Backing type for the shared memory
    pub backing_type: BackingType,
    /// Explicit file path, overriding the name-derived default
    pub file_path: Option<PathBuf>,
    /// Whether to create the object if it does not exist
    pub create: bool,
    /// Unix permissions used when creating
    pub permissions: u32,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            size: LAYOUT_SIZE,
            backing_type: BackingType::default(),
            file_path: None,
            create: true,
            permissions: 0o600,
        }
    }
}

impl RegionConfig {
    /// Create a configuration for the named region sized to the bridge layout
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the backing type
    pub fn with_backing_type(mut self, backing_type: BackingType) -> Self {
        self.backing_type = backing_type;
        self
    }

    /// Set the file path for file-backed regions
    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Set whether to create the region if it doesn't exist
    pub fn with_create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    /// Set the permissions for the region
    pub fn with_permissions(mut self, permissions: u32) -> Self {
        self.permissions = permissions;
        self
    }

    /// Override the mapping size
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        use crate::error::BridgeError;

        if self.name.is_empty() {
            return Err(BridgeError::invalid_parameter(
                "name",
                "Region name cannot be empty",
            ));
        }

        if self.name.contains('/') || self.name.contains('\0') {
            return Err(BridgeError::invalid_parameter(
                "name",
                "Region name cannot contain '/' or NUL",
            ));
        }

        if self.size < LAYOUT_SIZE {
            return Err(BridgeError::invalid_parameter(
                "size",
                format!(
                    "Region size {} is below the {} bytes the layout needs",
                    self.size, LAYOUT_SIZE
                ),
            ));
        }

        #[cfg(target_os = "linux")]
        if self.backing_type == BackingType::MemFd && !self.create {
            return Err(BridgeError::invalid_parameter(
                "create",
                "memfd regions are anonymous and can only be created",
            ));
        }

        Ok(())
    }

    /// Path the file-backed object lives at
    pub fn default_file_path(&self) -> PathBuf {
        self.file_path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(format!("framebridge_{}", self.name)))
    }
}
