//! In-memory collaborator implementations for development and testing.

pub mod repository;
pub mod security;
pub mod streams;
