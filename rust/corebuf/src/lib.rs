//! Allocator-parameterized growable buffers of plain-data elements.
//!
//! - [`Buffer`]: the growable buffer engine, bound to a borrowed [`Allocator`].
//! - [`Array`]: a typed array, which is a buffer by another name.
//! - [`AnsiString`]: a byte string keeping a trailing terminator.
//! - [`with_formatted`]: scratch formatting into a per-thread arena.

pub mod array;
pub mod buffer;
pub mod format;
pub mod string;

pub use array::Array;
pub use buffer::{Buffer, BufferState};
pub use format::with_formatted;
pub use string::AnsiString;

pub use corebuf_alloc::{Allocator, ArenaAllocator, ArenaConfig, DefaultAllocator, default_allocator};
pub use corebuf_common::{Result, error::Error};
