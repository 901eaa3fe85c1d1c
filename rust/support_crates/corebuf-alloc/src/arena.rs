//! Single-slot arena allocator over one fixed backing block.
//!
//! Every allocation returns the start of the same block. This is only sound
//! while at most one allocation is alive, so the arena is meant to host one
//! long-lived object per thread (see the thread-local formatted string in
//! the `corebuf` crate).

use std::alloc::{Layout, alloc_zeroed, dealloc};
use std::marker::PhantomData;
use std::ptr::NonNull;

use corebuf_common::{Result, error::Error};

use crate::allocator::Allocator;
use crate::config::ArenaConfig;

/// An allocator that always hands out the same fixed block.
///
/// - `allocate` returns the start of the block for any request that fits.
/// - `free` does nothing.
/// - `reallocate` returns the input pointer when the new size fits.
///
/// The arena is neither `Send` nor `Sync`; keep one per thread.
pub struct ArenaAllocator {
    block: NonNull<u8>,
    config: ArenaConfig,
    _not_send: PhantomData<*mut u8>,
}

impl ArenaAllocator {
    /// Allocates the backing block described by `config`.
    ///
    /// # Safety
    ///
    /// All allocations alias the same block. The caller must ensure that at
    /// most one allocation obtained from this arena is in use at any time.
    pub unsafe fn new(config: ArenaConfig) -> Result<ArenaAllocator> {
        config.validate()?;
        let layout = Layout::from_size_align(config.capacity, config.alignment)
            .map_err(|_| Error::invalid_arg("config", "invalid arena layout"))?;
        let block = NonNull::new(unsafe { alloc_zeroed(layout) })
            .ok_or_else(|| Error::allocation_failed(config.capacity, config.alignment))?;
        log::trace!(
            "arena block of {} bytes aligned to {} allocated",
            config.capacity,
            config.alignment
        );
        Ok(ArenaAllocator {
            block,
            config,
            _not_send: PhantomData,
        })
    }

    /// Size of the backing block in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Alignment of the backing block.
    #[inline]
    pub fn alignment(&self) -> usize {
        self.config.alignment
    }

    /// Start address of the backing block.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.block.as_ptr()
    }

    #[inline]
    fn fits(&self, size: usize, align: usize) -> bool {
        size <= self.config.capacity && align <= self.config.alignment
    }
}

unsafe impl Allocator for ArenaAllocator {
    fn allocate(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        if self.fits(size, align) {
            Some(self.block)
        } else {
            log::debug!(
                "arena of {} bytes cannot hold {size} bytes aligned to {align}",
                self.config.capacity
            );
            None
        }
    }

    #[inline]
    unsafe fn free(&self, _ptr: NonNull<u8>) {}

    unsafe fn reallocate(
        &self,
        ptr: Option<NonNull<u8>>,
        size: usize,
        align: usize,
    ) -> Option<NonNull<u8>> {
        match ptr {
            None => self.allocate(size, align),
            Some(_) if size == 0 => None,
            Some(ptr) if self.fits(size, align) => Some(ptr),
            Some(_) => {
                log::debug!(
                    "arena of {} bytes cannot grow to {size} bytes",
                    self.config.capacity
                );
                None
            }
        }
    }
}

impl Drop for ArenaAllocator {
    fn drop(&mut self) {
        unsafe {
            dealloc(
                self.block.as_ptr(),
                Layout::from_size_align_unchecked(self.config.capacity, self.config.alignment),
            );
        }
    }
}

impl std::fmt::Debug for ArenaAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaAllocator")
            .field("block", &self.block)
            .field("capacity", &self.config.capacity)
            .field("alignment", &self.config.alignment)
            .finish()
    }
}
