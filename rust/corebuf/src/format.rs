//! Scratch formatting into a per-thread arena.
//!
//! Each thread owns one [`ArenaAllocator`] whose block backs a single
//! [`AnsiString`]. [`with_formatted`] renders into that string and lends it to
//! a closure, so short-lived formatted text never touches the heap.

use std::cell::Cell;
use std::fmt;

use corebuf_alloc::config::{DEFAULT_ARENA_CAPACITY, DEFAULT_MEMORY_ALIGNMENT};
use corebuf_alloc::{ArenaAllocator, ArenaConfig};
use corebuf_common::{Result, error::Error};

use crate::string::AnsiString;

/// Longest formatted output, in bytes; the rest of the arena holds the terminator.
pub const MAX_FORMAT_CHARS: usize = DEFAULT_ARENA_CAPACITY - 1;

thread_local! {
    static FORMAT_ARENA: Option<ArenaAllocator> = {
        // SAFETY: only `with_formatted` allocates from this arena, and
        // `FORMAT_IN_USE` keeps it to one live string at a time.
        match unsafe { ArenaAllocator::new(ArenaConfig::default()) } {
            Ok(arena) => Some(arena),
            Err(e) => {
                log::debug!("format arena unavailable: {e}");
                None
            }
        }
    };

    static FORMAT_IN_USE: Cell<bool> = const { Cell::new(false) };
}

/// Formats `args` into the thread's scratch string and passes it to `f`.
///
/// Output longer than [`MAX_FORMAT_CHARS`] bytes is truncated at a character
/// boundary. The string is only valid inside `f`; calling `with_formatted`
/// again from within `f` fails with an invalid-operation error.
///
/// ```
/// use corebuf::with_formatted;
///
/// let len = with_formatted(format_args!("{}-{}", "a", 42), |s| s.len()).unwrap();
/// assert_eq!(len, 4);
/// ```
pub fn with_formatted<R>(
    args: fmt::Arguments<'_>,
    f: impl FnOnce(&AnsiString<'_>) -> R,
) -> Result<R> {
    if FORMAT_IN_USE.replace(true) {
        return Err(Error::invalid_operation("nested with_formatted"));
    }
    let _in_use = InUse;

    FORMAT_ARENA.with(|arena| {
        let arena = arena
            .as_ref()
            .ok_or_else(|| Error::allocation_failed(DEFAULT_ARENA_CAPACITY, DEFAULT_MEMORY_ALIGNMENT))?;
        let mut text = AnsiString::new(arena);
        let mut out = Truncating {
            text: &mut text,
            truncated: false,
        };
        fmt::write(&mut out, args).map_err(|_| Error::invalid_operation("format arguments"))?;
        if out.truncated {
            log::warn!("formatted output truncated to {MAX_FORMAT_CHARS} bytes");
        }
        Ok(f(&text))
    })
}

struct InUse;

impl Drop for InUse {
    fn drop(&mut self) {
        FORMAT_IN_USE.set(false);
    }
}

struct Truncating<'s, 'a> {
    text: &'s mut AnsiString<'a>,
    truncated: bool,
}

impl fmt::Write for Truncating<'_, '_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = MAX_FORMAT_CHARS - self.text.len();
        let take = if s.len() <= room {
            s.len()
        } else {
            self.truncated = true;
            (0..=room).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
        };
        self.text.push_str(&s[..take]).map_err(|_| fmt::Error)
    }
}
