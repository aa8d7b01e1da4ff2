//! Bounds-checked typed access to a mapped region
//!
//! All numeric fields are stored little-endian and accessed atomically, so
//! both processes observe whole values and the acquire/release pairs in the
//! channel protocols carry payload visibility across the process boundary.

use std::{
    ptr::NonNull,
    sync::{
        atomic::{AtomicU32, AtomicU8, Ordering},
        Arc,
    },
};

use crate::{
    error::{BridgeError, Result},
    memory::SharedMemoryRegion,
};

/// Raw view over a mapping with checked field accessors
#[derive(Debug)]
pub struct RegionView {
    region: Arc<SharedMemoryRegion>,
    base: NonNull<u8>,
    len: usize,
}

unsafe impl Send for RegionView {}
unsafe impl Sync for RegionView {}

impl RegionView {
    pub fn new(region: Arc<SharedMemoryRegion>) -> Result<Self> {
        let base = NonNull::new(region.base_ptr())
            .ok_or_else(|| BridgeError::platform("Mapping returned a null base address"))?;
        let len = region.size();
        Ok(Self { region, base, len })
    }

    /// The mapping this view reads
    pub fn region(&self) -> &Arc<SharedMemoryRegion> {
        &self.region
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn check(&self, offset: usize, length: usize, align: usize) -> Result<*mut u8> {
        let end = offset
            .checked_add(length)
            .ok_or_else(|| BridgeError::out_of_bounds(offset, length, self.len))?;
        if end > self.len || offset % align != 0 {
            return Err(BridgeError::out_of_bounds(offset, length, self.len));
        }
        Ok(unsafe { self.base.as_ptr().add(offset) })
    }

    fn atomic_u32(&self, offset: usize) -> Result<&AtomicU32> {
        let ptr = self.check(offset, 4, 4)?;
        // The mapping base is page aligned and `check` enforced 4-byte alignment.
        Ok(unsafe { &*(ptr as *const AtomicU32) })
    }

    fn atomic_u8(&self, offset: usize) -> Result<&AtomicU8> {
        let ptr = self.check(offset, 1, 1)?;
        Ok(unsafe { &*(ptr as *const AtomicU8) })
    }

    pub fn load_u32(&self, offset: usize, order: Ordering) -> Result<u32> {
        Ok(u32::from_le(self.atomic_u32(offset)?.load(order)))
    }

    pub fn store_u32(&self, offset: usize, value: u32, order: Ordering) -> Result<()> {
        self.atomic_u32(offset)?.store(value.to_le(), order);
        Ok(())
    }

    /// Compare-and-swap on a little-endian field, returning the previous value on failure
    pub fn compare_exchange_u32(
        &self,
        offset: usize,
        current: u32,
        new: u32,
    ) -> Result<std::result::Result<u32, u32>> {
        let result = self.atomic_u32(offset)?.compare_exchange(
            current.to_le(),
            new.to_le(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        Ok(result.map(u32::from_le).map_err(u32::from_le))
    }

    pub fn load_f32(&self, offset: usize, order: Ordering) -> Result<f32> {
        Ok(f32::from_bits(self.load_u32(offset, order)?))
    }

    pub fn store_f32(&self, offset: usize, value: f32, order: Ordering) -> Result<()> {
        self.store_u32(offset, value.to_bits(), order)
    }

    pub fn load_flag(&self, offset: usize, order: Ordering) -> Result<bool> {
        Ok(self.atomic_u8(offset)?.load(order) != 0)
    }

    pub fn store_flag(&self, offset: usize, value: bool, order: Ordering) -> Result<()> {
        self.atomic_u8(offset)?.store(value as u8, order);
        Ok(())
    }

    /// Set a flag and report its previous value
    pub fn swap_flag(&self, offset: usize, value: bool, order: Ordering) -> Result<bool> {
        Ok(self.atomic_u8(offset)?.swap(value as u8, order) != 0)
    }

    /// Copy `data` into the mapping
    ///
    /// The caller must own the destination range under the channel protocol.
    pub fn write_bytes(&self, offset: usize, data: &[u8]) -> Result<()> {
        let dst = self.check(offset, data.len(), 1)?;
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
        }
        Ok(())
    }

    /// Borrow a byte range of the mapping
    ///
    /// # Safety
    /// The range must not be written by either process while the returned
    /// slice is alive. The frame protocol guarantees this for a slot whose
    /// header reads `consumed == false` until the consumer releases it.
    pub unsafe fn bytes(&self, offset: usize, length: usize) -> Result<&[u8]> {
        let ptr = self.check(offset, length, 1)?;
        Ok(std::slice::from_raw_parts(ptr as *const u8, length))
    }

    /// Zero a byte range
    pub fn zero(&self, offset: usize, length: usize) -> Result<()> {
        let dst = self.check(offset, length, 1)?;
        unsafe {
            std::ptr::write_bytes(dst, 0, length);
        }
        Ok(())
    }
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;
    use crate::memory::{BackingType, RegionConfig};

    fn view() -> RegionView {
        let config = RegionConfig::new("view").with_backing_type(BackingType::MemFd);
        RegionView::new(Arc::new(SharedMemoryRegion::open(&config).unwrap())).unwrap()
    }

    #[test]
    fn test_little_endian_storage() {
        let view = view();
        view.store_u32(16, 0x0102_0304, Ordering::Relaxed).unwrap();
        let bytes = unsafe { view.bytes(16, 4).unwrap() };
        assert_eq!(bytes, &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(view.load_u32(16, Ordering::Relaxed).unwrap(), 0x0102_0304);
    }

    #[test]
    fn test_bounds_and_alignment() {
        let view = view();
        let len = view.len();
        assert!(matches!(
            view.load_u32(len, Ordering::Relaxed),
            Err(BridgeError::OutOfBounds { .. })
        ));
        assert!(matches!(
            view.load_u32(2, Ordering::Relaxed),
            Err(BridgeError::OutOfBounds { .. })
        ));
        assert!(view.write_bytes(len - 2, &[1, 2, 3]).is_err());
        assert!(view.write_bytes(usize::MAX, &[1]).is_err());
    }

    #[test]
    fn test_flag_swap() {
        let view = view();
        assert!(!view.swap_flag(3, true, Ordering::AcqRel).unwrap());
        assert!(view.swap_flag(3, false, Ordering::AcqRel).unwrap());
        assert!(!view.load_flag(3, Ordering::Acquire).unwrap());
    }
}
