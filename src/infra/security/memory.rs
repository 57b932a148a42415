//! In-memory authorization policy and impersonator.

use std::collections::{HashMap, HashSet};
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use crate::core::{AuthorizationPolicy, Identity, Impersonator};

/// Policy backed by a fixed set of allowed action names.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorizationPolicy {
    allowed: HashSet<String>,
    allow_all: bool,
}

impl StaticAuthorizationPolicy {
    /// Allow every action.
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            allowed: HashSet::new(),
            allow_all: true,
        }
    }

    /// Deny every action.
    #[must_use]
    pub fn deny_all() -> Self {
        Self::default()
    }

    /// Allow exactly `names`.
    pub fn allowing<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: names.into_iter().map(Into::into).collect(),
            allow_all: false,
        }
    }
}

impl AuthorizationPolicy for StaticAuthorizationPolicy {
    fn is_allowed(&self, action_name: &str) -> bool {
        self.allow_all || self.allowed.contains(action_name)
    }
}

/// Impersonator that keeps a per-thread stack of effective users.
///
/// Nested impersonation on one thread restores the outer user when the inner
/// scope ends. Every `begin` is kept in [`SessionImpersonator::history`].
#[derive(Debug, Default)]
pub struct SessionImpersonator {
    stacks: Mutex<HashMap<ThreadId, Vec<Identity>>>,
    history: Mutex<Vec<String>>,
}

impl SessionImpersonator {
    /// Create an impersonator with no active sessions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// User the calling thread currently runs as, if impersonating.
    #[must_use]
    pub fn current_user(&self) -> Option<String> {
        self.stacks
            .lock()
            .get(&thread::current().id())
            .and_then(|stack| stack.last())
            .map(|identity| identity.username().to_owned())
    }

    /// Users impersonated so far, in order.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history.lock().clone()
    }

    /// Number of sessions not yet ended, across all threads.
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.stacks.lock().values().map(Vec::len).sum()
    }
}

impl Impersonator for SessionImpersonator {
    fn begin(&self, username: &str) -> Identity {
        let identity = Identity::new(username);
        self.stacks
            .lock()
            .entry(thread::current().id())
            .or_default()
            .push(identity.clone());
        self.history.lock().push(username.to_owned());
        identity
    }

    fn end(&self, identity: &Identity) {
        let mut stacks = self.stacks.lock();
        let id = thread::current().id();
        if let Some(stack) = stacks.get_mut(&id) {
            if let Some(pos) = stack.iter().rposition(|i| i.session() == identity.session()) {
                stack.remove(pos);
            }
            if stack.is_empty() {
                stacks.remove(&id);
            }
        }
    }
}
