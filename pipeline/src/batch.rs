use anyhow::Result;
use orangegrove_types::{Document, DocumentKey};
use std::collections::BTreeMap;

use crate::store::{Status, Store};

/// Read-through write overlay.
///
/// Handlers stage every write here and commit the whole set with one
/// [`Store::apply`], so a handler either lands all of its documents or none
/// of them. Reads see staged writes first, then fall through to the store.
pub struct Batch<'a, S: Store> {
    store: &'a S,
    pending: BTreeMap<DocumentKey, Status>,
}

impl<'a, S: Store> Batch<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            pending: BTreeMap::new(),
        }
    }

    pub async fn get(&self, key: &DocumentKey) -> Result<Option<Document>> {
        Ok(match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.store.get(key).await?,
        })
    }

    pub fn insert(&mut self, key: DocumentKey, value: Document) {
        self.pending.insert(key, Status::Update(value));
    }

    pub fn delete(&mut self, key: DocumentKey) {
        self.pending.insert(key, Status::Delete);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// The staged writes, consuming the batch without committing. Callers
    /// hand these to [`Store::apply`].
    pub fn into_changes(self) -> Vec<(DocumentKey, Status)> {
        self.pending.into_iter().collect()
    }

    /// Commit all staged writes atomically and return them.
    pub async fn commit(self) -> Result<Vec<(DocumentKey, Status)>> {
        let store = self.store;
        let changes = self.into_changes();
        store.apply(changes.clone()).await?;
        Ok(changes)
    }
}
