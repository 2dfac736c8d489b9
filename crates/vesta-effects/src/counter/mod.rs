//! Persistent counter handlers

pub mod memory;

pub use memory::MemoryCounterStore;
