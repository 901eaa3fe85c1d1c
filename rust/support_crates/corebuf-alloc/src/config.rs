//! Allocation parameters shared by the allocators.

use corebuf_common::{Result, verify_arg};

/// Alignment used when a caller has no stronger requirement.
pub const DEFAULT_MEMORY_ALIGNMENT: usize = 16;

/// Default size of an arena's backing block, in bytes.
pub const DEFAULT_ARENA_CAPACITY: usize = 4096;

/// Configuration of an [`ArenaAllocator`](crate::arena::ArenaAllocator).
///
/// The arena hands out a single slot of `capacity` bytes, aligned to
/// `alignment`. Requests for more bytes or a stronger alignment fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of the backing block in bytes. Must be non-zero.
    pub capacity: usize,

    /// Alignment of the backing block. Must be a power of two.
    pub alignment: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            capacity: DEFAULT_ARENA_CAPACITY,
            alignment: DEFAULT_MEMORY_ALIGNMENT,
        }
    }
}

impl ArenaConfig {
    /// Creates a configuration with the given capacity and the default alignment.
    pub fn with_capacity(capacity: usize) -> ArenaConfig {
        ArenaConfig {
            capacity,
            ..Default::default()
        }
    }

    /// Checks that the configuration describes a block that can be allocated.
    pub fn validate(&self) -> Result<()> {
        verify_arg!(capacity, self.capacity != 0);
        verify_arg!(alignment, self.alignment.is_power_of_two());
        verify_arg!(
            capacity,
            self.capacity <= isize::MAX as usize - (self.alignment - 1)
        );
        Ok(())
    }
}
