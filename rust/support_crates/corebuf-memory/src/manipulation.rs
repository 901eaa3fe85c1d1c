//! Byte-level copy, move, fill and compare over raw memory ranges.
//!
//! Every function takes raw pointers and a byte count. Pointers must be
//! non-null and valid for `bytes` bytes; a zero `bytes` is a legal no-op.
//! Contract violations are caught by debug assertions only.

/// Copies `bytes` bytes from `src` to `dst`.
///
/// Returns the number of bytes copied.
///
/// # Safety
///
/// - `src` must be valid for reads and `dst` valid for writes of `bytes` bytes.
/// - The two ranges must not overlap; use [`move_bytes`] when they may.
#[inline]
pub unsafe fn copy(dst: *mut u8, src: *const u8, bytes: usize) -> usize {
    debug_assert!(
        !dst.is_null() && !src.is_null(),
        "destination and source must be non-null"
    );
    debug_assert!(
        !ranges_overlap(dst, src, bytes),
        "destination range overlaps the source range"
    );
    unsafe { std::ptr::copy_nonoverlapping(src, dst, bytes) };
    bytes
}

/// Moves `bytes` bytes from `src` to `dst`; the ranges may overlap.
///
/// The destination range ends up holding the original source bytes. After the
/// call, the part of the source range outside of the destination holds
/// unspecified values.
///
/// Returns the number of bytes moved.
///
/// # Safety
///
/// `src` must be valid for reads and `dst` valid for writes of `bytes` bytes.
#[inline]
pub unsafe fn move_bytes(dst: *mut u8, src: *const u8, bytes: usize) -> usize {
    debug_assert!(
        !dst.is_null() && !src.is_null(),
        "destination and source must be non-null"
    );
    unsafe { std::ptr::copy(src, dst, bytes) };
    bytes
}

/// Splats `value` over `bytes` bytes starting at `dst`.
///
/// Returns the number of bytes written.
///
/// # Safety
///
/// `dst` must be valid for writes of `bytes` bytes.
#[inline]
pub unsafe fn set(dst: *mut u8, value: u8, bytes: usize) -> usize {
    debug_assert!(!dst.is_null(), "destination must be non-null");
    unsafe { dst.write_bytes(value, bytes) };
    bytes
}

/// Compares `bytes` bytes at `a` and `b`.
///
/// # Safety
///
/// Both pointers must be valid for reads of `bytes` bytes.
#[inline]
pub unsafe fn is_equal(a: *const u8, b: *const u8, bytes: usize) -> bool {
    debug_assert!(
        !a.is_null() && !b.is_null(),
        "compared ranges must be non-null"
    );
    if bytes == 0 || a == b {
        return true;
    }
    let (a, b) = unsafe {
        (
            std::slice::from_raw_parts(a, bytes),
            std::slice::from_raw_parts(b, bytes),
        )
    };
    a == b
}

/// Whether `[a, a + bytes)` and `[b, b + bytes)` share at least one byte.
#[inline]
pub fn ranges_overlap(a: *const u8, b: *const u8, bytes: usize) -> bool {
    let (a, b) = (a as usize, b as usize);
    bytes != 0 && a < b.saturating_add(bytes) && b < a.saturating_add(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy() {
        let src = *b"Lore Ipsum";
        let mut dst = [0u8; 10];
        let n = unsafe { copy(dst.as_mut_ptr(), src.as_ptr(), src.len()) };
        assert_eq!(n, 10);
        assert_eq!(&dst, b"Lore Ipsum");
    }

    #[test]
    fn test_zero_length_is_noop() {
        let mut dst = [7u8; 4];
        let src = [1u8; 4];
        unsafe {
            assert_eq!(copy(dst.as_mut_ptr(), src.as_ptr(), 0), 0);
            assert_eq!(move_bytes(dst.as_mut_ptr(), src.as_ptr(), 0), 0);
            assert_eq!(set(dst.as_mut_ptr(), 0, 0), 0);
            assert!(is_equal(dst.as_ptr(), src.as_ptr(), 0));
        }
        assert_eq!(dst, [7u8; 4]);
    }

    #[test]
    fn test_move_forward_overlap() {
        let mut v = *b"abcdefgh";
        let p = v.as_mut_ptr();
        // Shift "abcdef" two positions right, destination after source.
        unsafe { move_bytes(p.add(2), p, 6) };
        assert_eq!(&v[2..], b"abcdef");
    }

    #[test]
    fn test_move_backward_overlap() {
        let mut v = *b"abcdefgh";
        let p = v.as_mut_ptr();
        unsafe { move_bytes(p, p.add(3), 5) };
        assert_eq!(&v[..5], b"defgh");
    }

    #[test]
    fn test_set_and_is_equal() {
        let mut a = [0u8; 16];
        let b = [0x5au8; 16];
        unsafe {
            assert!(!is_equal(a.as_ptr(), b.as_ptr(), 16));
            assert_eq!(set(a.as_mut_ptr(), 0x5a, 16), 16);
            assert!(is_equal(a.as_ptr(), b.as_ptr(), 16));
            set(a.as_mut_ptr().add(15), 0, 1);
            assert!(is_equal(a.as_ptr(), b.as_ptr(), 15));
            assert!(!is_equal(a.as_ptr(), b.as_ptr(), 16));
        }
    }

    #[test]
    fn test_ranges_overlap() {
        let v = [0u8; 16];
        let p = v.as_ptr();
        unsafe {
            assert!(ranges_overlap(p, p.add(3), 4));
            assert!(ranges_overlap(p.add(3), p, 4));
            assert!(!ranges_overlap(p, p.add(4), 4));
            assert!(!ranges_overlap(p, p, 0));
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "destination range overlaps the source range")]
    fn test_copy_rejects_overlap() {
        let mut v = [0u8; 8];
        let p = v.as_mut_ptr();
        unsafe { copy(p.add(1), p, 4) };
    }
}
