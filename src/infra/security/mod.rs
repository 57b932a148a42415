//! Authorization and impersonation backends.

pub mod memory;

pub use memory::{SessionImpersonator, StaticAuthorizationPolicy};
