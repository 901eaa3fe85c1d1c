//! Pluggable memory allocators for corebuf buffers.
//!
//! - [`Allocator`]: the allocate/free/reallocate capability buffers are bound to.
//! - [`DefaultAllocator`]: thread-safe aligned heap allocation.
//! - [`ArenaAllocator`]: a single fixed block reused by every allocation.

pub mod allocator;
pub mod arena;
pub mod config;
pub mod default;

pub use allocator::Allocator;
pub use arena::ArenaAllocator;
pub use config::ArenaConfig;
pub use default::{DefaultAllocator, default_allocator};
