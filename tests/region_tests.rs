//! Integration tests for opening, mapping and attaching bridge regions

use std::sync::{atomic::Ordering, Arc};

use framebridge::{
    error::{BridgeError, OpenErrorKind},
    layout::{
        BridgeRegion, RegionView, ACTIVE_INDEX_OFFSET, BRIDGE_MAGIC, LAYOUT_SIZE, MAGIC_OFFSET,
        VERSION_OFFSET,
    },
    memory::{BackingType, RegionConfig, SharedMemoryRegion},
    sync::WaitPolicy,
    Attachment, BridgeConfig,
};
use tempfile::TempDir;

#[cfg(test)]
mod tests {
    use super::*;

    fn file_config(temp_dir: &TempDir, name: &str) -> RegionConfig {
        RegionConfig::new(name)
            .with_backing_type(BackingType::FileBacked)
            .with_file_path(temp_dir.path().join(format!("{}.shm", name)))
    }

    #[test]
    fn test_create_file_backed_region() {
        let temp_dir = TempDir::new().unwrap();
        let config = file_config(&temp_dir, "create");

        let region = SharedMemoryRegion::open(&config).unwrap();
        assert_eq!(region.name(), "create");
        assert_eq!(region.size(), LAYOUT_SIZE);
        assert!(region.metadata().created);

        let on_disk = std::fs::metadata(temp_dir.path().join("create.shm")).unwrap();
        assert_eq!(on_disk.len() as usize, LAYOUT_SIZE);

        drop(region);
        let reopened = SharedMemoryRegion::open(&config.with_create(false)).unwrap();
        assert!(!reopened.metadata().created);
    }

    #[test]
    fn test_open_missing_region_reports_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let config = file_config(&temp_dir, "missing").with_create(false);

        match SharedMemoryRegion::open(&config) {
            Err(BridgeError::Open { name, kind, .. }) => {
                assert_eq!(name, "missing");
                assert_eq!(kind, OpenErrorKind::NotFound);
            }
            other => panic!("expected Open error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_existing_file_too_small() {
        let temp_dir = TempDir::new().unwrap();
        let config = file_config(&temp_dir, "small").with_create(false);
        std::fs::write(temp_dir.path().join("small.shm"), [0u8; 4096]).unwrap();

        match SharedMemoryRegion::open(&config) {
            Err(BridgeError::RegionTooSmall { required, actual }) => {
                assert_eq!(required, LAYOUT_SIZE);
                assert_eq!(actual, 4096);
            }
            other => panic!("expected RegionTooSmall, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_invalid_config_rejected_before_open() {
        let temp_dir = TempDir::new().unwrap();
        let config = file_config(&temp_dir, "bad/name");
        assert!(matches!(
            SharedMemoryRegion::open(&config),
            Err(BridgeError::InvalidParameter { .. })
        ));

        let config = file_config(&temp_dir, "tiny").with_size(1024);
        assert!(matches!(
            SharedMemoryRegion::open(&config),
            Err(BridgeError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_two_mappings_share_contents() {
        let temp_dir = TempDir::new().unwrap();
        let config = file_config(&temp_dir, "shared");

        let first = Arc::new(SharedMemoryRegion::open(&config).unwrap());
        let second = Arc::new(SharedMemoryRegion::open(&config).unwrap());
        assert_ne!(first.base_ptr(), second.base_ptr());

        let attached = BridgeRegion::attach(first, &WaitPolicy::default()).unwrap();
        let raw = RegionView::new(second).unwrap();
        assert_eq!(raw.load_u32(MAGIC_OFFSET, Ordering::Acquire).unwrap(), BRIDGE_MAGIC);

        attached
            .view()
            .store_u32(ACTIVE_INDEX_OFFSET, 1, Ordering::Release)
            .unwrap();
        assert_eq!(raw.load_u32(ACTIVE_INDEX_OFFSET, Ordering::Acquire).unwrap(), 1);
    }

    #[test]
    fn test_foreign_magic_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config = file_config(&temp_dir, "foreign");
        let mapping = Arc::new(SharedMemoryRegion::open(&config).unwrap());

        RegionView::new(mapping.clone())
            .unwrap()
            .store_u32(MAGIC_OFFSET, 0xDEAD_BEEF, Ordering::Release)
            .unwrap();

        match BridgeRegion::attach(mapping, &WaitPolicy::default()) {
            Err(BridgeError::LayoutMismatch {
                field,
                expected,
                actual,
            }) => {
                assert_eq!(field, "magic");
                assert_eq!(expected, BRIDGE_MAGIC);
                assert_eq!(actual, 0xDEAD_BEEF);
            }
            other => panic!("expected LayoutMismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_newer_layout_version_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config = BridgeConfig::new("versioned").with_region(file_config(&temp_dir, "versioned"));

        let attachment = Attachment::open(&config).unwrap();
        attachment
            .region()
            .view()
            .store_u32(VERSION_OFFSET, 2, Ordering::Release)
            .unwrap();

        assert!(matches!(
            Attachment::open(&config),
            Err(BridgeError::LayoutMismatch {
                field: "version",
                ..
            })
        ));
    }

    #[test]
    fn test_attachment_keeps_existing_state() {
        let temp_dir = TempDir::new().unwrap();
        let config = BridgeConfig::new("resume").with_region(file_config(&temp_dir, "resume"));

        let first = Attachment::open(&config).unwrap();
        first
            .region()
            .view()
            .store_u32(ACTIVE_INDEX_OFFSET, 1, Ordering::Release)
            .unwrap();

        let second = Attachment::open(&config).unwrap();
        assert_eq!(second.region().active_index().unwrap(), 1);
    }
}
