//! In-memory reference adapter for [`crate::PersistencePort`].
//!
//! This is not the git plumbing the host object database is expected to
//! provide — it never shells out and never touches a filesystem. It exists
//! purely as the test double a ports-and-adapters design needs to exercise
//! the engine in process, without a real object database behind it.

use std::collections::HashMap;
use std::sync::Mutex;

use cas_core::CasError;
use sha2::{Digest, Sha256};

use crate::format::{format_entries, parse_entries};
use crate::{PersistencePort, TreeEntry, TreeEntryLine};

#[derive(Debug, Clone)]
enum Object {
    Blob(Vec<u8>),
    Tree(String),
}

/// In-memory content-addressable store: OIDs are SHA-256 hex digests of the
/// stored content (blobs) or of the joined tree-entry lines (trees).
#[derive(Default)]
pub struct InMemoryPersistence {
    objects: Mutex<HashMap<String, Object>>,
}

impl InMemoryPersistence {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { objects: Mutex::new(HashMap::new()) }
    }

    /// Number of objects currently stored (blobs and trees combined). Useful
    /// in tests asserting that a pipeline skipped chunk writes entirely.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }
}

fn digest_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

impl PersistencePort for InMemoryPersistence {
    fn write_blob(&self, content: &[u8]) -> Result<String, CasError> {
        let oid = digest_hex(content);
        self.objects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(oid.clone(), Object::Blob(content.to_vec()));
        Ok(oid)
    }

    fn write_tree(&self, entries: &[TreeEntryLine]) -> Result<String, CasError> {
        let body = format_entries(entries);
        let oid = digest_hex(body.as_bytes());
        self.objects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(oid.clone(), Object::Tree(body));
        Ok(oid)
    }

    fn read_blob(&self, oid: &str) -> Result<Vec<u8>, CasError> {
        match self.objects.lock().unwrap_or_else(std::sync::PoisonError::into_inner).get(oid) {
            Some(Object::Blob(bytes)) => Ok(bytes.clone()),
            Some(Object::Tree(_)) => Err(CasError::git_error(std::io::Error::other(format!(
                "{oid} is a tree, not a blob"
            )))),
            None => Err(CasError::git_error(std::io::Error::other(format!("no such object {oid}")))),
        }
    }

    fn read_tree(&self, tree_oid: &str) -> Result<Vec<TreeEntry>, CasError> {
        let body = match self.objects.lock().unwrap_or_else(std::sync::PoisonError::into_inner).get(tree_oid) {
            Some(Object::Tree(body)) => body.clone(),
            Some(Object::Blob(_)) => {
                return Err(CasError::git_error(std::io::Error::other(format!(
                    "{tree_oid} is a blob, not a tree"
                ))))
            }
            None => return Err(CasError::git_error(std::io::Error::other(format!("no such object {tree_oid}")))),
        };
        parse_entries(&body)
    }
}
