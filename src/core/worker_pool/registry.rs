//! Registry of live pool threads.
//!
//! Rust offers no way to enumerate a process's threads, so the pool records
//! every thread it spawns here. An entry exists exactly as long as the
//! thread's body runs: it is added before the thread starts and removed by a
//! guard the body owns, which also drops when the body unwinds.

use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

/// Snapshot of one registered thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    /// Thread name.
    pub name: String,
    /// Whether the thread is a daemon (never joined on drop).
    pub daemon: bool,
}

#[derive(Debug, Default)]
struct RegistryInner {
    threads: Mutex<BTreeMap<u64, ThreadInfo>>,
    next_id: AtomicU64,
}

/// Shared registry of live threads. Cloning shares the registry.
#[derive(Debug, Clone, Default)]
pub struct ThreadRegistry {
    inner: Arc<RegistryInner>,
}

impl ThreadRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a named thread that stays registered while `body` runs.
    ///
    /// # Errors
    ///
    /// The OS error if the thread cannot be created; the entry is removed
    /// again in that case.
    pub fn spawn<F>(
        &self,
        name: String,
        daemon: bool,
        stack_size: Option<usize>,
        body: F,
    ) -> io::Result<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        let guard = self.register(name.clone(), daemon);
        let mut builder = thread::Builder::new().name(name);
        if let Some(size) = stack_size {
            builder = builder.stack_size(size);
        }
        builder.spawn(move || {
            let _registration = guard;
            body();
        })
    }

    /// Every live registered thread.
    #[must_use]
    pub fn live_threads(&self) -> Vec<ThreadInfo> {
        self.inner.threads.lock().values().cloned().collect()
    }

    /// Live threads of the pool named `pool_name`, i.e. whose name starts
    /// with `"{pool_name}_"`.
    #[must_use]
    pub fn live_threads_of(&self, pool_name: &str) -> Vec<ThreadInfo> {
        let prefix = format!("{pool_name}_");
        self.inner
            .threads
            .lock()
            .values()
            .filter(|t| t.name.starts_with(&prefix))
            .cloned()
            .collect()
    }

    /// Number of live registered threads.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.inner.threads.lock().len()
    }

    fn register(&self, name: String, daemon: bool) -> Registration {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.threads.lock().insert(id, ThreadInfo { name, daemon });
        Registration {
            inner: Arc::clone(&self.inner),
            id,
        }
    }
}

struct Registration {
    inner: Arc<RegistryInner>,
    id: u64,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.inner.threads.lock().remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_lives_as_long_as_body() {
        let registry = ThreadRegistry::new();
        let (tx, rx) = crossbeam_channel::bounded::<()>(0);
        let handle = registry
            .spawn("RegTest_Worker-1".into(), true, None, move || {
                let _ = rx.recv();
            })
            .unwrap();
        assert_eq!(registry.live_threads_of("RegTest"), vec![ThreadInfo {
            name: "RegTest_Worker-1".into(),
            daemon: true,
        }]);
        drop(tx);
        handle.join().unwrap();
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn pool_lookup_ignores_longer_names() {
        let registry = ThreadRegistry::new();
        let (tx, rx) = crossbeam_channel::bounded::<()>(0);
        let rx2 = rx.clone();
        let a = registry
            .spawn("Pool_Worker-1".into(), true, None, move || {
                let _ = rx.recv();
            })
            .unwrap();
        let b = registry
            .spawn("Pool2_Worker-1".into(), true, None, move || {
                let _ = rx2.recv();
            })
            .unwrap();

        let pool: Vec<_> = registry.live_threads_of("Pool").into_iter().map(|t| t.name).collect();
        assert_eq!(pool, ["Pool_Worker-1"]);
        assert_eq!(registry.live_threads_of("Pool2").len(), 1);
        assert!(registry.live_threads_of("Poo").is_empty());

        drop(tx);
        a.join().unwrap();
        b.join().unwrap();
    }

    #[test]
    fn entry_removed_on_panic() {
        let registry = ThreadRegistry::new();
        let handle = registry
            .spawn("reg-panic".into(), false, None, || panic!("boom"))
            .unwrap();
        assert!(handle.join().is_err());
        assert!(registry.live_threads().is_empty());
    }
}
