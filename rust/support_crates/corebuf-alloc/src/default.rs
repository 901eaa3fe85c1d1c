//! Aligned heap allocator on top of the global Rust allocator.
//!
//! Each block is over-allocated by its alignment. The returned address is the
//! first aligned address past a small header, and the header records the
//! underlying heap block so that `free` and `reallocate` can recover it:
//!
//! ```text
//! base                         ptr (aligned)
//! |<------- align ------------>|
//! +--------------+------+------+------------------------+----+
//! | padding      | base | len  | usable bytes (>= size) | .. |
//! +--------------+------+------+------------------------+----+
//! |<----------------------- len --------------------------->|
//! ```

use std::alloc::{Layout, alloc, dealloc};
use std::ptr::NonNull;

use corebuf_memory::align::{align_down, alignment_of};
use corebuf_memory::manipulation;

use crate::allocator::Allocator;

/// Size of the block header stored right before every returned address.
const HEADER_SIZE: usize = std::mem::size_of::<BlockHeader>();

#[repr(C)]
struct BlockHeader {
    /// Start of the underlying heap block.
    base: *mut u8,
    /// Length of the underlying heap block.
    len: usize,
}

/// Thread-safe aligned allocator backed by the process heap.
///
/// The allocator is stateless; every instance behaves the same and may be
/// shared freely across threads. [`default_allocator`] returns a shared
/// static instance.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultAllocator;

static DEFAULT_ALLOCATOR: DefaultAllocator = DefaultAllocator;

/// Returns the process-wide default allocator.
pub fn default_allocator() -> &'static DefaultAllocator {
    &DEFAULT_ALLOCATOR
}

impl DefaultAllocator {
    /// Creates a new default allocator.
    pub const fn new() -> DefaultAllocator {
        DefaultAllocator
    }

    /// Returns the number of bytes usable from `ptr` to the end of its block.
    ///
    /// This is at least the size requested when the block was allocated.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by a `DefaultAllocator` and not freed since.
    pub unsafe fn usable_size(&self, ptr: NonNull<u8>) -> usize {
        let header = unsafe { read_header(ptr) };
        header.base as usize + header.len - ptr.as_ptr() as usize
    }

    fn allocate_block(size: usize, align: usize) -> Option<NonNull<u8>> {
        if size == 0 || !align.is_power_of_two() {
            return None;
        }

        // Room for the header is guaranteed by the alignment itself: the heap
        // block is header-aligned, so the first aligned address past `base`
        // is at least `HEADER_SIZE` bytes in.
        let align = align.max(HEADER_SIZE);
        let len = size.checked_add(align)?;
        let layout = Layout::from_size_align(len, HEADER_SIZE).ok()?;

        let Some(base) = NonNull::new(unsafe { alloc(layout) }) else {
            log::debug!("heap allocation of {len} bytes failed");
            return None;
        };

        let base_addr = base.as_ptr() as usize;
        let offset = align_down(base_addr + align, align) - base_addr;
        debug_assert!(offset >= HEADER_SIZE && offset <= align);

        unsafe {
            let ptr = base.as_ptr().add(offset);
            ptr.sub(HEADER_SIZE)
                .cast::<BlockHeader>()
                .write(BlockHeader {
                    base: base.as_ptr(),
                    len,
                });
            Some(NonNull::new_unchecked(ptr))
        }
    }

    unsafe fn free_block(ptr: NonNull<u8>) {
        unsafe {
            let header = read_header(ptr);
            dealloc(
                header.base,
                Layout::from_size_align_unchecked(header.len, HEADER_SIZE),
            );
        }
    }
}

unsafe impl Allocator for DefaultAllocator {
    #[inline]
    fn allocate(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        Self::allocate_block(size, align)
    }

    #[inline]
    unsafe fn free(&self, ptr: NonNull<u8>) {
        unsafe { Self::free_block(ptr) }
    }

    unsafe fn reallocate(
        &self,
        ptr: Option<NonNull<u8>>,
        size: usize,
        align: usize,
    ) -> Option<NonNull<u8>> {
        let Some(ptr) = ptr else {
            return Self::allocate_block(size, align);
        };
        if size == 0 {
            unsafe { Self::free_block(ptr) };
            return None;
        }

        let usable = unsafe { self.usable_size(ptr) };
        if size <= usable && alignment_of(ptr.as_ptr() as usize) >= align {
            return Some(ptr);
        }

        let new_ptr = Self::allocate_block(size, align)?;
        unsafe {
            manipulation::copy(new_ptr.as_ptr(), ptr.as_ptr(), usable.min(size));
            Self::free_block(ptr);
        }
        Some(new_ptr)
    }
}

unsafe fn read_header(ptr: NonNull<u8>) -> BlockHeader {
    unsafe {
        ptr.as_ptr()
            .sub(HEADER_SIZE)
            .cast::<BlockHeader>()
            .read()
    }
}
