//! Byte strings with a trailing terminator.

use std::fmt;

use corebuf_alloc::Allocator;
use corebuf_common::Result;

use crate::buffer::Buffer;

/// A growable byte string bound to an [`Allocator`].
///
/// Whenever the string holds an allocation, the byte right after the last
/// live byte is `0`, so [`AnsiString::as_bytes_with_nul`] can hand the
/// contents to code expecting a terminated string. Length is counted in
/// bytes; no character semantics are applied.
pub struct AnsiString<'a> {
    buf: Buffer<'a, u8>,
}

impl<'a> AnsiString<'a> {
    /// Creates an empty string; nothing is allocated.
    pub fn new(allocator: &'a dyn Allocator) -> AnsiString<'a> {
        AnsiString {
            buf: Buffer::new(allocator),
        }
    }

    /// Creates a string holding a copy of `s`.
    pub fn from_str_in(allocator: &'a dyn Allocator, s: &str) -> Result<AnsiString<'a>> {
        let mut string = AnsiString::new(allocator);
        string.push_str(s)?;
        Ok(string)
    }

    /// Length in bytes, not counting the terminator.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Capacity of the underlying buffer, terminator included.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Appends one byte. On error the string is unchanged.
    pub fn push(&mut self, byte: u8) -> Result<()> {
        self.buf.reserve(2)?;
        self.buf.push(byte)?;
        self.terminate()
    }

    /// Appends `s`. On error the string is unchanged.
    pub fn push_str(&mut self, s: &str) -> Result<()> {
        if s.is_empty() {
            return Ok(());
        }
        // Room for the bytes and the terminator is taken up front, so nothing
        // below can allocate.
        self.buf.reserve(s.len() + 1)?;
        self.buf.extend_from_slice(s.as_bytes())?;
        self.terminate()
    }

    /// Removes and returns the last byte.
    pub fn pop(&mut self) -> Option<u8> {
        let byte = self.buf.pop()?;
        // The popped slot takes the terminator, so this never allocates.
        let _ = self.terminate();
        Some(byte)
    }

    /// Shortens the string to `len` bytes; longer lengths are ignored.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            self.buf.clear(self.len() - len, 0);
        }
    }

    /// Empties the string, keeping its allocation.
    pub fn clear(&mut self) {
        self.buf.clear(usize::MAX, 0);
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }

    /// The live bytes followed by the terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        if self.buf.data().is_null() {
            return b"\0";
        }
        assert!(
            self.len() < self.capacity(),
            "string of {} bytes has no terminator slot",
            self.len()
        );
        // SAFETY: the terminator slot at `len` lies within the allocation and
        // was written by the last mutation.
        unsafe { std::slice::from_raw_parts(self.buf.data(), self.len() + 1) }
    }

    /// The contents as `&str`, if they are valid UTF-8.
    pub fn to_str(&self) -> std::result::Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(self.as_bytes())
    }

    fn terminate(&mut self) -> Result<()> {
        self.buf.write_terminator(0)
    }
}

impl fmt::Write for AnsiString<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s).map_err(|_| fmt::Error)
    }
}

impl fmt::Display for AnsiString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for AnsiString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&String::from_utf8_lossy(self.as_bytes()), f)
    }
}

impl PartialEq<str> for AnsiString<'_> {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for AnsiString<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}
