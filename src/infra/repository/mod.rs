//! Content repository backends.

pub mod memory;

pub use memory::InMemoryRepository;
