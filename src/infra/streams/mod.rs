//! Stream provider backends.

pub mod memory;

pub use memory::{InMemoryStreamProvider, RepositoryWriter};
