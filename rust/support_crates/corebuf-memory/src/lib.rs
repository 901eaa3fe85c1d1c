//! Raw memory primitives used by the corebuf allocators and buffers: overlap-aware
//! byte copies and the alignment/power-of-two arithmetic behind the capacity law.

pub mod align;
pub mod manipulation;
