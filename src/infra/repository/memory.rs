//! In-memory content repository.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::core::{Repository, RepositoryError, RepositoryFile, SCHEDULABLE_KEY};

#[derive(Debug, Clone)]
struct Entry {
    id: String,
    folder: bool,
    content: Vec<u8>,
    metadata: HashMap<String, serde_json::Value>,
}

/// Simple in-memory repository keyed by absolute path.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    entries: Mutex<BTreeMap<String, Entry>>,
    deleted: Mutex<Vec<String>>,
    fail_deletes: Mutex<bool>,
}

impl InMemoryRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a folder. `schedulable` sets the `schedulable` metadata flag when
    /// given; an absent flag means scheduling is allowed.
    pub fn add_folder(&self, path: &str, schedulable: Option<bool>) -> String {
        let mut metadata = HashMap::new();
        if let Some(flag) = schedulable {
            metadata.insert(SCHEDULABLE_KEY.to_owned(), serde_json::Value::Bool(flag));
        }
        self.insert(path, true, Vec::new(), metadata)
    }

    /// Create or replace a file with `content`.
    pub fn put_file(&self, path: &str, content: &[u8]) -> String {
        self.insert(path, false, content.to_vec(), HashMap::new())
    }

    /// Append to an existing file. Returns `false` if there is no such file.
    pub fn append(&self, path: &str, data: &[u8]) -> bool {
        match self.entries.lock().get_mut(path) {
            Some(entry) if !entry.folder => {
                entry.content.extend_from_slice(data);
                true
            }
            _ => false,
        }
    }

    /// Content of the file at `path`.
    #[must_use]
    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.entries
            .lock()
            .get(path)
            .filter(|e| !e.folder)
            .map(|e| e.content.clone())
    }

    /// Whether anything exists at `path`.
    #[must_use]
    pub fn exists(&self, path: &str) -> bool {
        self.entries.lock().contains_key(path)
    }

    /// Paths deleted so far, in order.
    #[must_use]
    pub fn deleted_paths(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }

    /// Make every subsequent delete fail with a backend error.
    pub fn fail_deletes(&self, fail: bool) {
        *self.fail_deletes.lock() = fail;
    }

    fn insert(
        &self,
        path: &str,
        folder: bool,
        content: Vec<u8>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        self.entries.lock().insert(
            path.to_owned(),
            Entry {
                id: id.clone(),
                folder,
                content,
                metadata,
            },
        );
        id
    }
}

impl Repository for InMemoryRepository {
    fn get_file(&self, path: &str) -> Result<Option<RepositoryFile>, RepositoryError> {
        Ok(self.entries.lock().get(path).map(|e| RepositoryFile {
            id: e.id.clone(),
            path: path.to_owned(),
            folder: e.folder,
            size: e.content.len() as u64,
        }))
    }

    fn get_file_metadata(
        &self,
        id: &str,
    ) -> Result<HashMap<String, serde_json::Value>, RepositoryError> {
        self.entries
            .lock()
            .values()
            .find(|e| e.id == id)
            .map(|e| e.metadata.clone())
            .ok_or_else(|| RepositoryError::NotFound(id.to_owned()))
    }

    fn delete_file(&self, file: &RepositoryFile) -> Result<(), RepositoryError> {
        if *self.fail_deletes.lock() {
            return Err(RepositoryError::Backend(format!(
                "delete of `{}` rejected",
                file.path
            )));
        }
        let mut entries = self.entries.lock();
        match entries.get(&file.path) {
            Some(entry) if entry.id == file.id => {
                entries.remove(&file.path);
                self.deleted.lock().push(file.path.clone());
                Ok(())
            }
            _ => Err(RepositoryError::NotFound(file.path.clone())),
        }
    }
}
