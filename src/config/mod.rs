//! Configuration models for the worker pool and output resolution.

pub mod output;
pub mod pool;

pub use output::OutputConfig;
pub use pool::WorkerPoolConfig;
