//! Impersonated execution.
//!
//! The invoker never reads an ambient "current user". It asks an
//! [`Impersonator`] to begin a session for the acting user, passes the
//! resulting [`Identity`] explicitly to the action, and ends the session when
//! the [`ImpersonationScope`] drops, which also happens while unwinding.

use uuid::Uuid;

/// Identity an action runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    username: String,
    session: Uuid,
}

impl Identity {
    /// New identity for `username` with a fresh session id.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            session: Uuid::new_v4(),
        }
    }

    /// The impersonated user.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Session id, unique per impersonation.
    #[must_use]
    pub const fn session(&self) -> Uuid {
        self.session
    }
}

/// Security collaborator that switches the effective identity.
pub trait Impersonator: Send + Sync {
    /// Start running as `username`.
    fn begin(&self, username: &str) -> Identity;

    /// Stop running as `identity` and restore whatever was in effect before.
    fn end(&self, identity: &Identity);
}

/// Active impersonation; ends it on drop.
pub struct ImpersonationScope<'a> {
    impersonator: &'a dyn Impersonator,
    identity: Identity,
}

impl<'a> ImpersonationScope<'a> {
    /// Begin impersonating `username`.
    pub fn enter(impersonator: &'a dyn Impersonator, username: &str) -> Self {
        let identity = impersonator.begin(username);
        tracing::trace!(user = username, session = %identity.session(), "impersonation started");
        Self {
            impersonator,
            identity,
        }
    }

    /// The identity in effect for this scope.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl Drop for ImpersonationScope<'_> {
    fn drop(&mut self) {
        self.impersonator.end(&self.identity);
        tracing::trace!(session = %self.identity.session(), "impersonation ended");
    }
}

/// Run `f` as `username`, restoring the previous identity on every exit path.
pub fn run_as_user<T>(
    impersonator: &dyn Impersonator,
    username: &str,
    f: impl FnOnce(&Identity) -> T,
) -> T {
    let scope = ImpersonationScope::enter(impersonator, username);
    f(scope.identity())
}
