//! The growable buffer engine.
//!
//! A [`Buffer`] is a `data`/`count`/`capacity` triple bound to a borrowed
//! [`Allocator`]. Its capacity always follows the capacity law: zero for an
//! empty allocation, otherwise a power of two large enough for the requested
//! count. Capacity only shrinks through [`Buffer::fit`], [`Buffer::resize`]
//! or [`Buffer::release`].
//!
//! Elements are plain data (`bytemuck::Pod`): every element move is a byte
//! copy and no constructor or destructor ever runs.

use std::fmt;
use std::mem::{align_of, size_of};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use bytemuck::Pod;
use corebuf_alloc::Allocator;
use corebuf_common::{Result, error::Error};
use corebuf_memory::align::{capacity_for, is_ptr_aligned, size_for};
use corebuf_memory::manipulation;

/// Outcome of checking a buffer's invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// All invariants hold.
    Ready,
    /// `count`, `capacity` and `data` disagree with each other.
    InconsistentProperties,
    /// `data` is not aligned for the element type.
    Misaligned,
}

/// A contiguous, growable sequence of plain-data elements allocated through
/// a borrowed [`Allocator`].
///
/// The buffer is not internally synchronized; concurrent mutation requires
/// external serialization, which the borrow checker already enforces through
/// `&mut self`.
///
/// Fallible operations return `Ok` both when they did something and when
/// there was nothing to do; `Err` always means an allocation was attempted and
/// failed (or its size could not be expressed), in which case the buffer is
/// left exactly as it was.
pub struct Buffer<'a, T: Pod> {
    data: Option<NonNull<T>>,
    count: usize,
    capacity: usize,
    allocator: &'a dyn Allocator,
}

impl<'a, T: Pod> Buffer<'a, T> {
    /// Creates an empty buffer bound to `allocator`; nothing is allocated.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    pub fn new(allocator: &'a dyn Allocator) -> Buffer<'a, T> {
        assert!(size_of::<T>() != 0, "zero-sized element types are not supported");
        Buffer {
            data: None,
            count: 0,
            capacity: 0,
            allocator,
        }
    }

    /// Creates an empty buffer able to hold at least `capacity` elements.
    pub fn with_capacity(allocator: &'a dyn Allocator, capacity: usize) -> Result<Buffer<'a, T>> {
        let mut buf = Buffer::new(allocator);
        buf.reserve(capacity)?;
        Ok(buf)
    }

    /// Creates a buffer holding a copy of `values`.
    pub fn from_slice(allocator: &'a dyn Allocator, values: &[T]) -> Result<Buffer<'a, T>> {
        let mut buf = Buffer::new(allocator);
        buf.copy_from_slice(values)?;
        Ok(buf)
    }

    /// Creates a copy of this buffer, with the same allocator and capacity.
    pub fn try_clone(&self) -> Result<Buffer<'a, T>> {
        let mut buf = Buffer::new(self.allocator);
        buf.reserve(self.capacity)?;
        buf.copy_from_slice(self.as_slice())?;
        Ok(buf)
    }

    /// The allocator this buffer is bound to.
    #[inline]
    pub fn allocator(&self) -> &'a dyn Allocator {
        self.allocator
    }

    /// Pointer to the first element, null when nothing is allocated.
    #[inline]
    pub fn data(&self) -> *const T {
        self.data
            .map_or(std::ptr::null(), |p| p.as_ptr() as *const T)
    }

    /// Number of live elements.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of elements the buffer can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether the buffer holds elements and has no spare capacity left.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.count > 0 && self.count == self.capacity
    }

    /// Size in bytes of the live elements.
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.count * size_of::<T>()
    }

    /// Size in bytes of the whole allocated capacity.
    #[inline]
    pub fn footprint(&self) -> usize {
        self.capacity * size_of::<T>()
    }

    /// Checks the buffer invariants without repairing anything.
    pub fn state(&self) -> BufferState {
        match self.data {
            None if self.capacity == 0 && self.count == 0 => BufferState::Ready,
            None => BufferState::InconsistentProperties,
            Some(_) if !self.capacity.is_power_of_two() || self.count > self.capacity => {
                BufferState::InconsistentProperties
            }
            Some(p) if !is_ptr_aligned(p.as_ptr(), align_of::<T>()) => BufferState::Misaligned,
            Some(_) => BufferState::Ready,
        }
    }

    /// Whether every buffer invariant holds.
    #[inline]
    pub fn validate(&self) -> bool {
        self.state() == BufferState::Ready
    }

    /// Returns a slice containing the live elements.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        match self.data {
            // SAFETY: `data` holds `capacity >= count` elements, all initialized.
            Some(p) => unsafe { std::slice::from_raw_parts(p.as_ptr(), self.count) },
            None => &[],
        }
    }

    /// Returns a mutable slice containing the live elements.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match self.data {
            // SAFETY: `data` holds `capacity >= count` elements, all initialized.
            Some(p) => unsafe { std::slice::from_raw_parts_mut(p.as_ptr(), self.count) },
            None => &mut [],
        }
    }

    /// Returns the live elements as raw bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }
}

impl<T: Pod> Buffer<'_, T> {
    /// Ensures room for `extra` more elements beyond the current count.
    ///
    /// After success, `capacity >= capacity_for(count + extra)`.
    pub fn reserve(&mut self, extra: usize) -> Result<()> {
        let total = self
            .count
            .checked_add(extra)
            .ok_or_else(|| Error::capacity_overflow(self.count, extra))?;
        self.grow_to_hold(total)
    }

    /// Sets the number of elements to `new_count`.
    ///
    /// The backing block is reallocated only when the capacity required by
    /// `new_count` differs from the current capacity, which may shrink it.
    /// Newly exposed elements are zeroed; elements cut off by a shrink are
    /// left as they are.
    pub fn resize(&mut self, new_count: usize) -> Result<()> {
        let new_capacity = capacity_for(new_count)
            .ok_or_else(|| Error::capacity_overflow(self.count, new_count.saturating_sub(self.count)))?;
        if new_capacity != self.capacity {
            self.set_capacity(new_capacity)?;
        }
        if new_count > self.count {
            // SAFETY: `new_count <= capacity` after the reallocation above.
            unsafe { self.zero_range(self.count, new_count) };
        }
        self.count = new_count;
        Ok(())
    }

    /// Shrinks the capacity to the smallest one that fits the live elements.
    ///
    /// A fresh block is allocated and the elements moved into it, since
    /// allocators are not required to shrink a block in place. An empty
    /// buffer is released entirely.
    pub fn fit(&mut self) -> Result<()> {
        let Some(old) = self.data else {
            return Ok(());
        };
        if self.count == 0 {
            self.release();
            return Ok(());
        }

        let target = capacity_for(self.count).unwrap_or(self.capacity);
        if target == self.capacity {
            return Ok(());
        }

        let bytes = target * size_of::<T>();
        let Some(block) = self.allocator.allocate(bytes, align_of::<T>()) else {
            log::debug!("fit: allocation of {bytes} bytes failed");
            return Err(Error::allocation_failed(bytes, align_of::<T>()));
        };

        let old = old.cast::<u8>();
        if block != old {
            // SAFETY: both blocks hold at least `count` elements; `old` came from this allocator.
            unsafe {
                manipulation::move_bytes(block.as_ptr(), old.as_ptr(), self.size_in_bytes());
                self.allocator.free(old);
            }
        }
        log::trace!("buffer capacity fitted: {} -> {target}", self.capacity);
        self.data = Some(block.cast());
        self.capacity = target;
        Ok(())
    }

    /// Frees the backing block and resets the buffer to its empty state.
    ///
    /// The buffer stays bound to its allocator and may be reused.
    pub fn release(&mut self) {
        if let Some(p) = self.data.take() {
            // SAFETY: `p` was returned by this allocator and is not used again.
            unsafe { self.allocator.free(p.cast()) };
            log::trace!("buffer released: capacity {}", self.capacity);
        }
        self.count = 0;
        self.capacity = 0;
    }

    /// Drops the last `num` elements, splatting `fill` over the dropped region.
    ///
    /// `num` is clamped to the count, so `usize::MAX` clears everything. The
    /// capacity is never changed. Returns the number of dropped elements.
    pub fn clear(&mut self, num: usize, fill: u8) -> usize {
        if num == 0 || self.count == 0 {
            return 0;
        }
        let dropped = num.min(self.count);
        let start = self.count - dropped;
        // SAFETY: `[start, count)` lies within the allocation.
        unsafe {
            manipulation::set(self.byte_ptr(start), fill, dropped * size_of::<T>());
        }
        self.count = start;
        dropped
    }

    /// Overwrites the elements in `[from, from + num)` with `value`.
    ///
    /// The range is clamped to the count. Elements are overwritten by copying
    /// the bytes of `value`. Returns the number of elements written.
    ///
    /// # Panics
    ///
    /// Panics if `from >= count`.
    pub fn set(&mut self, value: T, from: usize, num: usize) -> usize {
        self.check_index("set", from);
        let end = from.saturating_add(num).min(self.count);
        let bytes = bytemuck::bytes_of(&value);
        for index in from..end {
            // SAFETY: `index < count`; `value` lives on the stack, outside the buffer.
            unsafe { manipulation::copy(self.byte_ptr(index), bytes.as_ptr(), bytes.len()) };
        }
        end - from
    }

    /// Opens a gap of `num` elements at `from`.
    ///
    /// Elements in `[from, count)` are shifted to `[from + num, count + num)`.
    /// When `from > count`, the buffer is first padded up to `from` with
    /// zeroed elements. The gap keeps stale values until it is written. Zero
    /// `num` always succeeds.
    pub fn make_space(&mut self, from: usize, num: usize) -> Result<()> {
        if num == 0 {
            return Ok(());
        }
        let old_count = self.count;
        let new_count = from
            .max(old_count)
            .checked_add(num)
            .ok_or_else(|| Error::capacity_overflow(old_count, num))?;
        self.grow_to_hold(new_count)?;

        // SAFETY: `new_count <= capacity` after growing, and the shifted tail ends at `new_count`.
        unsafe {
            self.zero_range(old_count, new_count);
            if from < old_count {
                manipulation::move_bytes(
                    self.byte_ptr(from + num),
                    self.byte_ptr(from),
                    (old_count - from) * size_of::<T>(),
                );
            }
        }
        self.count = new_count;
        Ok(())
    }

    /// Inserts `num` copies of `value` at `from`.
    pub fn add(&mut self, value: T, from: usize, num: usize) -> Result<()> {
        self.make_space(from, num)?;
        if num != 0 {
            self.set(value, from, num);
        }
        Ok(())
    }

    /// Removes up to `num` elements starting at `from`, preserving the order
    /// of the remaining elements.
    ///
    /// Every element after the removed range is shifted left one at a time.
    /// Returns the number of removed elements.
    ///
    /// # Panics
    ///
    /// Panics if `from >= count`.
    pub fn remove(&mut self, from: usize, num: usize) -> usize {
        self.check_index("remove", from);
        let removed = num.min(self.count - from);
        if removed == 0 {
            return 0;
        }
        for index in from + removed..self.count {
            // SAFETY: `index < count` and the two single-element ranges never overlap.
            unsafe {
                manipulation::copy(
                    self.byte_ptr(index - removed),
                    self.byte_ptr(index),
                    size_of::<T>(),
                );
            }
        }
        self.count -= removed;
        removed
    }

    /// Removes up to `num` elements starting at `from` by filling the hole
    /// with the trailing elements.
    ///
    /// Runs in time proportional to the number of removed elements, but does
    /// not preserve the order of the remaining ones. Returns the number of
    /// removed elements.
    ///
    /// # Panics
    ///
    /// Panics if `from >= count`.
    pub fn replace_with_last(&mut self, from: usize, num: usize) -> usize {
        self.check_index("replace_with_last", from);
        let end = self.count;
        let removed = num.min(end - from);

        // Only the tail that survives past the hole needs to move.
        let move_from = (end - removed).max(from + removed);
        let moved = end - move_from;
        if moved != 0 {
            // SAFETY: both ranges lie within `[from, count)`; the move tolerates overlap.
            unsafe {
                manipulation::move_bytes(
                    self.byte_ptr(from),
                    self.byte_ptr(move_from),
                    moved * size_of::<T>(),
                );
            }
        }
        self.count -= removed;
        removed
    }

    /// Replaces the contents with `src[from..from + num]` (clamped).
    ///
    /// Returns the number of copied elements.
    ///
    /// # Panics
    ///
    /// Panics if `from > src.len()`.
    pub fn copy_from(&mut self, src: &[T], from: usize, num: usize) -> Result<usize> {
        let values = source_range(src, from, num);
        self.resize(values.len())?;
        // SAFETY: `resize` made room for exactly `values.len()` elements.
        unsafe { self.write_values(0, values) };
        Ok(values.len())
    }

    /// Inserts `src[from..from + num]` (clamped) at position `at`.
    ///
    /// `at` may be past the end, in which case the buffer is padded with
    /// zeroed elements. Returns the number of inserted elements.
    ///
    /// # Panics
    ///
    /// Panics if `from > src.len()`.
    pub fn insert(&mut self, at: usize, src: &[T], from: usize, num: usize) -> Result<usize> {
        let values = source_range(src, from, num);
        if values.is_empty() {
            return Ok(0);
        }
        self.make_space(at, values.len())?;
        // SAFETY: `make_space` opened `values.len()` slots at `at`.
        unsafe { self.write_values(at, values) };
        Ok(values.len())
    }

    /// Appends `src[from..from + num]` (clamped) after the last element.
    pub fn append(&mut self, src: &[T], from: usize, num: usize) -> Result<usize> {
        self.insert(self.count, src, from, num)
    }

    /// Replaces the contents with up to `num` elements taken from `src` at
    /// `from`, then removes them from `src`.
    ///
    /// `src` is only modified once the copy has succeeded, so on error both
    /// buffers are unchanged. Returns the number of extracted elements.
    ///
    /// # Panics
    ///
    /// Panics if `from >= src.count()`.
    pub fn extract(&mut self, src: &mut Buffer<'_, T>, from: usize, num: usize) -> Result<usize> {
        src.check_index("extract", from);
        let extracted = num.min(src.count - from);
        self.copy_from(src.as_slice(), from, extracted)?;
        src.remove(from, extracted);
        Ok(extracted)
    }

    /// Replaces the contents with a copy of `values`.
    pub fn copy_from_slice(&mut self, values: &[T]) -> Result<()> {
        self.copy_from(values, 0, values.len()).map(drop)
    }

    /// Appends a copy of `values`.
    pub fn extend_from_slice(&mut self, values: &[T]) -> Result<()> {
        self.append(values, 0, values.len()).map(drop)
    }

    /// Inserts a copy of `values` before the first element.
    pub fn append_front(&mut self, values: &[T]) -> Result<()> {
        self.insert(0, values, 0, values.len()).map(drop)
    }

    /// Appends one element.
    pub fn push(&mut self, value: T) -> Result<()> {
        self.reserve(1)?;
        // SAFETY: `reserve(1)` guarantees `count < capacity`.
        unsafe { self.write_values(self.count, std::slice::from_ref(&value)) };
        self.count += 1;
        Ok(())
    }

    /// Removes and returns the last element, `None` when empty.
    pub fn pop(&mut self) -> Option<T> {
        let value = *self.as_slice().last()?;
        self.count -= 1;
        Some(value)
    }

    /// Inserts one element before the first one.
    pub fn push_front(&mut self, value: T) -> Result<()> {
        self.add(value, 0, 1)
    }

    /// Removes and returns the first element, `None` when empty.
    pub fn pop_front(&mut self) -> Option<T> {
        let value = *self.as_slice().first()?;
        self.remove(0, 1);
        Some(value)
    }

    /// Copies a raw byte blob over the elements starting at `at`.
    ///
    /// The buffer is not grown; this is the way to load elements from
    /// external memory into a buffer already sized for them. Returns the
    /// number of bytes written.
    ///
    /// # Panics
    ///
    /// Panics if `at >= count` or if `bytes` does not fit in the elements
    /// from `at` to the end.
    pub fn write(&mut self, bytes: &[u8], at: usize) -> usize {
        self.check_index("write", at);
        assert!(
            bytes.len() <= (self.count - at) * size_of::<T>(),
            "write of {} bytes overflows the buffer at {at}",
            bytes.len()
        );
        // SAFETY: the assertions above keep the write inside `[at, count)`.
        unsafe { manipulation::copy(self.byte_ptr(at), bytes.as_ptr(), bytes.len()) }
    }

    /// Stores `value` right past the last element without counting it.
    ///
    /// Room is reserved if needed. Used to keep a sentinel, such as a string
    /// terminator, behind the live elements.
    pub fn write_terminator(&mut self, value: T) -> Result<()> {
        self.reserve(1)?;
        // SAFETY: `reserve(1)` guarantees `count < capacity`.
        unsafe { self.write_values(self.count, std::slice::from_ref(&value)) };
        Ok(())
    }

    /// Finds the first occurrence of `pattern` starting at or after `from`.
    pub fn find_first(&self, pattern: &[T], from: usize) -> Option<usize> {
        if pattern.is_empty() {
            return None;
        }
        let len = pattern.len();
        let mut at = from;
        while at < self.count && self.count - at >= len {
            if self.matches_at(at, pattern) {
                return Some(at);
            }
            at += 1;
        }
        None
    }

    /// Finds the last occurrence of `pattern` ending at or before `from`.
    ///
    /// `from` is clamped to the last element, so `usize::MAX` searches the
    /// whole buffer.
    pub fn find_last(&self, pattern: &[T], from: usize) -> Option<usize> {
        if pattern.is_empty() || self.count == 0 {
            return None;
        }
        let len = pattern.len();
        let mut end = from.min(self.count - 1) + 1;
        while end >= len {
            if self.matches_at(end - len, pattern) {
                return Some(end - len);
            }
            end -= 1;
        }
        None
    }
}

impl<T: Pod> Buffer<'_, T> {
    /// Grows the capacity, if needed, so that `total` elements fit.
    fn grow_to_hold(&mut self, total: usize) -> Result<()> {
        let needed = capacity_for(total)
            .ok_or_else(|| Error::capacity_overflow(self.count, total - self.count))?;
        if needed > self.capacity {
            self.set_capacity(needed)
        } else {
            Ok(())
        }
    }

    /// Reallocates the backing block for exactly `new_capacity` elements.
    ///
    /// On failure nothing is modified. The count is left to the caller.
    fn set_capacity(&mut self, new_capacity: usize) -> Result<()> {
        debug_assert!(new_capacity == 0 || new_capacity.is_power_of_two());
        if new_capacity == 0 {
            self.release();
            return Ok(());
        }

        let align = align_of::<T>();
        let bytes = size_for::<T>(new_capacity)
            .ok_or_else(|| Error::capacity_overflow(new_capacity, 0))?;
        let old = self.data.map(NonNull::cast::<u8>);
        // SAFETY: `old` is this buffer's block, obtained from the same allocator.
        let Some(block) = (unsafe { self.allocator.reallocate(old, bytes, align) }) else {
            log::debug!(
                "reallocation from {} to {new_capacity} elements ({bytes} bytes) failed",
                self.capacity
            );
            return Err(Error::allocation_failed(bytes, align));
        };
        debug_assert!(is_ptr_aligned(block.as_ptr(), align));

        log::trace!("buffer capacity changed: {} -> {new_capacity}", self.capacity);
        self.data = Some(block.cast());
        self.capacity = new_capacity;
        Ok(())
    }

    /// Address of element `index`; may point one past the live elements.
    ///
    /// # Safety
    ///
    /// The buffer must be allocated and `index <= capacity`.
    #[inline]
    unsafe fn byte_ptr(&self, index: usize) -> *mut u8 {
        debug_assert!(index <= self.capacity);
        match self.data {
            Some(p) => unsafe { p.as_ptr().add(index).cast() },
            None => unreachable!("element access on an unallocated buffer"),
        }
    }

    /// # Safety
    ///
    /// `start <= end <= capacity`.
    #[inline]
    unsafe fn zero_range(&mut self, start: usize, end: usize) {
        if start < end {
            unsafe { manipulation::set(self.byte_ptr(start), 0, (end - start) * size_of::<T>()) };
        }
    }

    /// Copies `values` into the slots starting at `at`.
    ///
    /// # Safety
    ///
    /// `at + values.len() <= capacity`; `values` must not point into this buffer.
    #[inline]
    unsafe fn write_values(&mut self, at: usize, values: &[T]) {
        if !values.is_empty() {
            let bytes: &[u8] = bytemuck::cast_slice(values);
            unsafe { manipulation::copy(self.byte_ptr(at), bytes.as_ptr(), bytes.len()) };
        }
    }

    #[inline]
    fn matches_at(&self, at: usize, pattern: &[T]) -> bool {
        let size = size_of::<T>();
        let needle: &[u8] = bytemuck::cast_slice(pattern);
        &self.as_bytes()[at * size..(at + pattern.len()) * size] == needle
    }

    #[inline]
    fn check_index(&self, op: &str, index: usize) {
        assert!(
            index < self.count,
            "{op}: index {index} out of range for count {}",
            self.count
        );
    }
}

/// Clamps `[from, from + num)` to `src`.
#[inline]
fn source_range<T>(src: &[T], from: usize, num: usize) -> &[T] {
    assert!(
        from <= src.len(),
        "source index {from} out of range for length {}",
        src.len()
    );
    let len = num.min(src.len() - from);
    &src[from..from + len]
}

impl<T: Pod> Drop for Buffer<'_, T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: Pod> Deref for Buffer<'_, T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T: Pod> DerefMut for Buffer<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<'b, T: Pod> PartialEq<Buffer<'b, T>> for Buffer<'_, T> {
    fn eq(&self, other: &Buffer<'b, T>) -> bool {
        self.count == other.count
            && (self.count == 0
                // SAFETY: both buffers hold `count` initialized elements.
                || unsafe {
                    manipulation::is_equal(
                        self.data().cast(),
                        other.data().cast(),
                        self.size_in_bytes(),
                    )
                })
    }
}

impl<T: Pod + fmt::Debug> fmt::Debug for Buffer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("values", &self.as_slice())
            .field("count", &self.count)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl std::io::Write for Buffer<'_, u8> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.extend_from_slice(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
