//! Traits consumed by the kernel

pub mod behavior;

pub use behavior::*;
