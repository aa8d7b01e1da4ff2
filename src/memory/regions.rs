//! Named shared memory region opener

use std::{
    ffi::CString,
    fs::{File, OpenOptions},
    io::ErrorKind,
    os::unix::fs::OpenOptionsExt,
    time::SystemTime,
};

use log::debug;
use memmap2::{MmapMut, MmapOptions};

use crate::error::{BridgeError, Result};

use super::config::{BackingType, RegionConfig};

/// Descriptive data about an opened region
#[derive(Debug, Clone)]
pub struct RegionMetadata {
    pub name: String,
    pub size: usize,
    pub backing_type: BackingType,
    pub opened_at: SystemTime,
    /// Whether this process created the backing object
    pub created: bool,
}

/// A mapped shared memory region
///
/// Dropping the region unmaps this process's view only; the backing object
/// stays alive for any other process that still maps it.
#[derive(Debug)]
pub struct SharedMemoryRegion {
    metadata: RegionMetadata,
    mmap: MmapMut,
    _file: File,
}

impl SharedMemoryRegion {
    /// Open (and optionally create) the region described by `config`
    pub fn open(config: &RegionConfig) -> Result<Self> {
        config.validate()?;

        let (file, created) = match config.backing_type {
            BackingType::FileBacked => Self::open_file_backing(config)?,
            #[cfg(target_os = "linux")]
            BackingType::MemFd => (Self::create_memfd_backing(config)?, true),
        };

        let actual = file
            .metadata()
            .map_err(|e| BridgeError::from_io(e, "Failed to stat region"))?
            .len() as usize;
        if actual < config.size {
            if !config.create {
                return Err(BridgeError::RegionTooSmall {
                    required: config.size,
                    actual,
                });
            }
            file.set_len(config.size as u64)
                .map_err(|e| BridgeError::from_io(e, "Failed to set region size"))?;
        }

        let mmap = unsafe {
            MmapOptions::new()
                .len(config.size)
                .map_mut(&file)
                .map_err(|e| BridgeError::from_io(e, "Failed to create memory mapping"))?
        };

        debug!(
            "mapped region '{}' ({} bytes, {}, created={})",
            config.name,
            config.size,
            config.backing_type.name(),
            created
        );

        Ok(Self {
            metadata: RegionMetadata {
                name: config.name.clone(),
                size: config.size,
                backing_type: config.backing_type,
                opened_at: SystemTime::now(),
                created,
            },
            mmap,
            _file: file,
        })
    }

    fn open_file_backing(config: &RegionConfig) -> Result<(File, bool)> {
        let path = config.default_file_path();

        // Exclusive create decides atomically which process made the object.
        if config.create {
            match OpenOptions::new()
                .read(true)
                .write(true)
                .create_new(true)
                .mode(config.permissions)
                .open(&path)
            {
                Ok(file) => return Ok((file, true)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => return Err(BridgeError::open(config.name.clone(), e)),
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| BridgeError::open(config.name.clone(), e))?;

        Ok((file, false))
    }

    #[cfg(target_os = "linux")]
    fn create_memfd_backing(config: &RegionConfig) -> Result<File> {
        use nix::sys::memfd::{memfd_create, MemFdCreateFlag};

        let name_cstr = CString::new(format!("framebridge_{}", config.name))
            .map_err(|_| BridgeError::invalid_parameter("name", "Name contains null bytes"))?;

        let owned_fd = memfd_create(name_cstr.as_c_str(), MemFdCreateFlag::MFD_CLOEXEC)
            .map_err(|e| BridgeError::platform(format!("Failed to create memfd: {}", e)))?;

        Ok(File::from(owned_fd))
    }

    /// Get the region metadata
    pub fn metadata(&self) -> &RegionMetadata {
        &self.metadata
    }

    /// Base address of the mapping
    ///
    /// Writes through the returned pointer must follow the bridge ownership
    /// protocol; the mapping itself stays valid for the lifetime of `self`.
    pub fn base_ptr(&self) -> *mut u8 {
        self.mmap.as_ptr() as *mut u8
    }

    /// Get the size of the mapping
    pub fn size(&self) -> usize {
        self.metadata.size
    }

    /// Get the name of the region
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Flush changes to the backing object
    pub fn flush(&self) -> Result<()> {
        self.mmap
            .flush()
            .map_err(|e| BridgeError::from_io(e, "Failed to flush memory mapping"))
    }

    /// Release this process's view
    pub fn close(self) {
        debug!("unmapping region '{}'", self.metadata.name);
    }
}

unsafe impl Send for SharedMemoryRegion {}
unsafe impl Sync for SharedMemoryRegion {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OpenErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_without_create() {
        let dir = TempDir::new().unwrap();
        let config = RegionConfig::new("missing")
            .with_file_path(dir.path().join("missing"))
            .with_create(false);

        let err = SharedMemoryRegion::open(&config).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Open {
                kind: OpenErrorKind::NotFound,
                ..
            }
        ));
    }

    #[test]
    fn test_create_then_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shared");
        let config = RegionConfig::new("shared").with_file_path(&path);

        let first = SharedMemoryRegion::open(&config).unwrap();
        assert!(first.metadata().created);
        assert_eq!(first.size(), config.size);

        let second = SharedMemoryRegion::open(&config.clone().with_create(false)).unwrap();
        assert!(!second.metadata().created);

        unsafe {
            first.base_ptr().add(100).write(0x5A);
            assert_eq!(second.base_ptr().add(100).read(), 0x5A);
        }
    }

    #[test]
    fn test_concurrent_create_has_one_creator() {
        let dir = TempDir::new().unwrap();
        let config = RegionConfig::new("race").with_file_path(dir.path().join("race"));
        let barrier = std::sync::Arc::new(std::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let config = config.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    SharedMemoryRegion::open(&config).unwrap().metadata().created
                })
            })
            .collect();

        let creators = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|created| *created)
            .count();
        assert_eq!(creators, 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_memfd_region() {
        let config = RegionConfig::new("anon").with_backing_type(BackingType::MemFd);
        let region = SharedMemoryRegion::open(&config).unwrap();
        assert_eq!(region.metadata().backing_type, BackingType::MemFd);
        assert_eq!(region.size(), config.size);
    }
}
