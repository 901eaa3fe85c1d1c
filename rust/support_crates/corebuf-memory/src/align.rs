//! Alignment and power-of-two arithmetic shared by the allocators and the buffer engine.

/// Aligns a number up to the next multiple of the specified alignment.
///
/// This function rounds up the input number to the nearest multiple of the alignment
/// that is greater than or equal to the input. If the input is already aligned,
/// it returns the input unchanged.
///
/// # Arguments
///
/// * `n` - The number to align up
/// * `alignment` - The alignment boundary (must be a power of 2 and non-zero)
///
/// # Returns
///
/// The smallest multiple of `alignment` that is greater than or equal to `n`,
/// or `None` when that multiple is not representable.
///
/// # Examples
///
/// ```
/// use corebuf_memory::align::align_up;
///
/// assert_eq!(align_up(0, 8), Some(0));
/// assert_eq!(align_up(1, 8), Some(8));
/// assert_eq!(align_up(8, 8), Some(8));
/// assert_eq!(align_up(9, 8), Some(16));
/// assert_eq!(align_up(usize::MAX, 8), None);
/// ```
#[inline]
pub fn align_up(n: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment.is_power_of_two());
    Some(n.checked_add(alignment - 1)? & !(alignment - 1))
}

/// Aligns a number down to the previous multiple of the specified alignment.
///
/// # Examples
///
/// ```
/// use corebuf_memory::align::align_down;
///
/// assert_eq!(align_down(0, 8), 0);
/// assert_eq!(align_down(7, 8), 0);
/// assert_eq!(align_down(9, 8), 8);
/// assert_eq!(align_down(16, 8), 16);
/// ```
///
/// # Panics
///
/// This function will panic in debug builds if `alignment` is not a power of 2.
#[inline]
pub fn align_down(n: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    n & !(alignment - 1)
}

/// Checks if a number is aligned to the specified alignment boundary.
///
/// # Examples
///
/// ```
/// use corebuf_memory::align::is_aligned;
///
/// assert!(is_aligned(0, 8));
/// assert!(!is_aligned(7, 8));
/// assert!(is_aligned(16, 8));
/// ```
#[inline]
pub fn is_aligned(n: usize, alignment: usize) -> bool {
    debug_assert!(alignment.is_power_of_two());
    (n & (alignment - 1)) == 0
}

/// Checks if a pointer is aligned to the specified alignment boundary.
#[inline]
pub fn is_ptr_aligned<T>(ptr: *const T, alignment: usize) -> bool {
    is_aligned(ptr as usize, alignment)
}

/// Returns the largest power of two the address is a multiple of.
///
/// A null address is reported as aligned to `1`, as it carries no usable
/// alignment information.
///
/// ```
/// use corebuf_memory::align::alignment_of;
///
/// assert_eq!(alignment_of(0), 1);
/// assert_eq!(alignment_of(0x40), 0x40);
/// assert_eq!(alignment_of(0x48), 8);
/// ```
#[inline]
pub fn alignment_of(addr: usize) -> usize {
    if addr == 0 {
        1
    } else {
        1 << addr.trailing_zeros()
    }
}

/// Number of elements a buffer must be able to hold to store `count` elements.
///
/// Zero elements need no storage at all; any other count is rounded up to the
/// next power of two. Returns `None` when the rounded value overflows.
///
/// | count | capacity |
/// |-------|----------|
/// | 0     | 0        |
/// | 1     | 1        |
/// | 3     | 4        |
/// | 5     | 8        |
/// | 8     | 8        |
#[inline]
pub fn capacity_for(count: usize) -> Option<usize> {
    if count == 0 {
        Some(0)
    } else {
        count.checked_next_power_of_two()
    }
}

/// Size in bytes of `count` elements of `T`, `None` on overflow.
#[inline]
pub fn size_for<T>(count: usize) -> Option<usize> {
    count.checked_mul(std::mem::size_of::<T>())
}

/// Number of `T` elements needed to cover `bytes` bytes (rounded up).
#[inline]
pub fn count_for_bytes<T>(bytes: usize) -> usize {
    bytes.div_ceil(std::mem::size_of::<T>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_for_is_next_power_of_two() {
        assert_eq!(capacity_for(0), Some(0));
        assert_eq!(capacity_for(1), Some(1));
        assert_eq!(capacity_for(2), Some(2));
        assert_eq!(capacity_for(3), Some(4));
        assert_eq!(capacity_for(5), Some(8));
        assert_eq!(capacity_for(7), Some(8));
        assert_eq!(capacity_for(8), Some(8));
        assert_eq!(capacity_for(9), Some(16));
        assert_eq!(capacity_for(usize::MAX), None);

        for n in 1..4096usize {
            let cap = capacity_for(n).unwrap();
            assert!(cap.is_power_of_two());
            assert!(cap >= n);
            assert!(cap / 2 < n);
        }
    }

    #[test]
    fn test_alignment_of() {
        assert_eq!(alignment_of(1), 1);
        assert_eq!(alignment_of(2), 2);
        assert_eq!(alignment_of(6), 2);
        assert_eq!(alignment_of(4096), 4096);
        assert_eq!(alignment_of(4096 + 32), 32);
    }

    #[test]
    fn test_element_sizes() {
        assert_eq!(size_for::<u32>(5), Some(20));
        assert_eq!(size_for::<u64>(usize::MAX), None);
        assert_eq!(count_for_bytes::<u32>(0), 0);
        assert_eq!(count_for_bytes::<u32>(1), 1);
        assert_eq!(count_for_bytes::<u32>(8), 2);
        assert_eq!(count_for_bytes::<u32>(9), 3);
    }

    #[test]
    fn test_is_ptr_aligned() {
        let v = [0u64; 2];
        assert!(is_ptr_aligned(v.as_ptr(), std::mem::align_of::<u64>()));
        let p = unsafe { (v.as_ptr() as *const u8).add(1) };
        assert!(!is_ptr_aligned(p, 2));
    }
}
