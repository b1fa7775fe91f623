use anyhow::{anyhow, Result};
use orangegrove_types::{Document, DocumentKey};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// A staged document write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Update(Document),
    Delete,
}

/// Document-store client surface consumed by the pipeline.
///
/// Implementations are handles to a shared, transactional document database;
/// the pipeline itself holds no other mutable state. Two primitives carry
/// the consistency guarantees:
///
/// - [`Store::apply`] commits a batch of writes all-or-nothing.
/// - [`Store::update`] runs a single-document atomic read-modify-write; the
///   closure sees the current committed value and returns the replacement
///   (or `None` to leave the document untouched) plus an arbitrary result.
pub trait Store {
    fn get(&self, key: &DocumentKey) -> impl Future<Output = Result<Option<Document>>> + Send;

    fn insert(&self, key: DocumentKey, value: Document) -> impl Future<Output = Result<()>> + Send;

    fn delete(&self, key: &DocumentKey) -> impl Future<Output = Result<()>> + Send;

    /// Commit a batch of writes atomically.
    fn apply(
        &self,
        changes: Vec<(DocumentKey, Status)>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Atomic read-modify-write on a single document.
    fn update<F, R>(&self, key: DocumentKey, f: F) -> impl Future<Output = Result<R>> + Send
    where
        F: FnOnce(Option<Document>) -> (Option<Document>, R) + Send,
        R: Send;
}

/// In-memory store used by tests and the replay binary.
///
/// A single mutex scopes every operation, which makes `apply` and `update`
/// trivially atomic. Handles are cheap clones sharing the same map, the
/// same way remote client handles share one database.
#[derive(Clone, Default)]
pub struct Memory {
    state: Arc<Mutex<BTreeMap<DocumentKey, Document>>>,
}

impl Memory {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<DocumentKey, Document>>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("memory store poisoned"))
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.state.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every key currently in the store, in path order.
    pub fn keys(&self) -> Vec<DocumentKey> {
        self.state
            .lock()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl Store for Memory {
    async fn get(&self, key: &DocumentKey) -> Result<Option<Document>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn insert(&self, key: DocumentKey, value: Document) -> Result<()> {
        self.lock()?.insert(key, value);
        Ok(())
    }

    async fn delete(&self, key: &DocumentKey) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn apply(&self, changes: Vec<(DocumentKey, Status)>) -> Result<()> {
        let mut state = self.lock()?;
        for (key, status) in changes {
            match status {
                Status::Update(value) => {
                    state.insert(key, value);
                }
                Status::Delete => {
                    state.remove(&key);
                }
            }
        }
        Ok(())
    }

    async fn update<F, R>(&self, key: DocumentKey, f: F) -> Result<R>
    where
        F: FnOnce(Option<Document>) -> (Option<Document>, R) + Send,
        R: Send,
    {
        let mut state = self.lock()?;
        let current = state.get(&key).cloned();
        let (next, result) = f(current);
        if let Some(next) = next {
            state.insert(key, next);
        }
        Ok(result)
    }
}

/// A store wrapper that fails the first N mutating calls, then recovers.
/// Used by tests to exercise fail-open and fatal-and-retryable paths.
#[cfg(test)]
pub(crate) struct Flaky {
    pub inner: Memory,
    pub failures_remaining: std::sync::atomic::AtomicU32,
}

#[cfg(test)]
impl Flaky {
    pub fn new(inner: Memory, failures: u32) -> Self {
        Self {
            inner,
            failures_remaining: std::sync::atomic::AtomicU32::new(failures),
        }
    }

    fn tick(&self) -> Result<()> {
        use std::sync::atomic::Ordering;
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(anyhow!("injected store failure"));
        }
        Ok(())
    }
}

/// A store wrapper that fails only batched applies, N times. Single-document
/// updates and reads pass through, which lets tests crash a handler between
/// its payout transaction and its activity commit.
#[cfg(test)]
pub(crate) struct FlakyApply {
    pub inner: Memory,
    failures_remaining: std::sync::atomic::AtomicU32,
}

#[cfg(test)]
impl FlakyApply {
    pub fn new(inner: Memory, failures: u32) -> Self {
        Self {
            inner,
            failures_remaining: std::sync::atomic::AtomicU32::new(failures),
        }
    }
}

#[cfg(test)]
impl Store for FlakyApply {
    async fn get(&self, key: &DocumentKey) -> Result<Option<Document>> {
        self.inner.get(key).await
    }

    async fn insert(&self, key: DocumentKey, value: Document) -> Result<()> {
        self.inner.insert(key, value).await
    }

    async fn delete(&self, key: &DocumentKey) -> Result<()> {
        self.inner.delete(key).await
    }

    async fn apply(&self, changes: Vec<(DocumentKey, Status)>) -> Result<()> {
        use std::sync::atomic::Ordering;
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(anyhow!("injected apply failure"));
        }
        self.inner.apply(changes).await
    }

    async fn update<F, R>(&self, key: DocumentKey, f: F) -> Result<R>
    where
        F: FnOnce(Option<Document>) -> (Option<Document>, R) + Send,
        R: Send,
    {
        self.inner.update(key, f).await
    }
}

#[cfg(test)]
impl Store for Flaky {
    async fn get(&self, key: &DocumentKey) -> Result<Option<Document>> {
        self.inner.get(key).await
    }

    async fn insert(&self, key: DocumentKey, value: Document) -> Result<()> {
        self.tick()?;
        self.inner.insert(key, value).await
    }

    async fn delete(&self, key: &DocumentKey) -> Result<()> {
        self.tick()?;
        self.inner.delete(key).await
    }

    async fn apply(&self, changes: Vec<(DocumentKey, Status)>) -> Result<()> {
        self.tick()?;
        self.inner.apply(changes).await
    }

    async fn update<F, R>(&self, key: DocumentKey, f: F) -> Result<R>
    where
        F: FnOnce(Option<Document>) -> (Option<Document>, R) + Send,
        R: Send,
    {
        self.tick()?;
        self.inner.update(key, f).await
    }
}
