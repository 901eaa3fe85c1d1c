//! Typed arrays.
//!
//! An array is the buffer engine over an arbitrary plain-data element type;
//! this module only adds constructors bound to the shared default allocator.

use bytemuck::Pod;
use corebuf_alloc::{Allocator, default_allocator};
use corebuf_common::Result;

use crate::buffer::Buffer;

/// A growable typed array.
pub type Array<'a, T> = Buffer<'a, T>;

impl<T: Pod> Buffer<'static, T> {
    /// Creates an empty array backed by the shared default allocator.
    pub fn with_default_allocator() -> Array<'static, T> {
        Buffer::new(default_allocator())
    }
}

impl<T: Pod> Default for Buffer<'static, T> {
    fn default() -> Self {
        Buffer::with_default_allocator()
    }
}

/// Collects `values` into a new array bound to `allocator`.
pub fn collect_in<'a, T, I>(allocator: &'a dyn Allocator, values: I) -> Result<Array<'a, T>>
where
    T: Pod,
    I: IntoIterator<Item = T>,
{
    let values = values.into_iter();
    let mut array = Array::with_capacity(allocator, values.size_hint().0)?;
    for value in values {
        array.push(value)?;
    }
    Ok(array)
}
