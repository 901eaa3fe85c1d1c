//! `Allocator`: the three-operation capability every buffer allocates through.

use std::ptr::NonNull;

/// A source of raw, aligned memory blocks.
///
/// Buffers never own their allocator; they borrow it for their whole
/// lifetime, so an allocator must outlive every buffer bound to it.
/// Callers must not assume that two calls return distinct blocks: an
/// allocator is only required to return a block of at least the requested
/// size and alignment, or `None`.
///
/// # Safety
///
/// Implementors must guarantee that:
/// - A block returned by [`allocate`](Allocator::allocate) or
///   [`reallocate`](Allocator::reallocate) is valid for reads and writes of
///   the requested size and aligned to at least the requested alignment.
/// - The block remains valid until it is passed to `free` or to a
///   `reallocate` call that returns a non-null block.
/// - `reallocate` preserves the first `min(old_size, new_size)` bytes.
/// - A failed `reallocate` (returning `None` for a non-zero size) leaves the
///   original block valid and unmodified.
pub unsafe trait Allocator {
    /// Allocates a block of at least `size` bytes aligned to `align`.
    ///
    /// `size` must be non-zero and `align` a power of two. Returns `None`
    /// when the request cannot be satisfied.
    fn allocate(&self, size: usize, align: usize) -> Option<NonNull<u8>>;

    /// Releases a block.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by this allocator and not freed since.
    unsafe fn free(&self, ptr: NonNull<u8>);

    /// Resizes a block, possibly moving it.
    ///
    /// - `ptr == None` behaves as [`allocate`](Allocator::allocate).
    /// - `size == 0` frees `ptr` and returns `None`.
    /// - Otherwise returns a block of at least `size` bytes aligned to
    ///   `align`; when the result is `Some`, the old pointer must not be
    ///   used again (unless it is the returned one). When the result is
    ///   `None`, `ptr` is still valid and owned by the caller.
    ///
    /// # Safety
    ///
    /// `ptr`, when present, must have been returned by this allocator and not
    /// freed since.
    unsafe fn reallocate(
        &self,
        ptr: Option<NonNull<u8>>,
        size: usize,
        align: usize,
    ) -> Option<NonNull<u8>>;
}
