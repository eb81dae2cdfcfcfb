//! Shared fixtures for threadline-core integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use threadline_core::{Clock, NotePath, NotifyCallback, ThreadConfig};
use threadline_store::{DocumentStore, DocumentStoreError, DocumentStoreResult, InMemoryDocumentStore};

pub fn p(s: &str) -> NotePath {
    NotePath::from(s)
}

/// 2024-03-07 09:05:02.042
pub fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 7)
        .unwrap()
        .and_hms_milli_opt(9, 5, 2, 42)
        .unwrap()
}

pub const FIRST_ID: &str = "20240307090502042";
pub const SECOND_ID: &str = "20240307090502043";

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(fixed_time()))
}

pub fn config() -> ThreadConfig {
    ThreadConfig::default()
}

/// Store seeded with `(path, text)` documents
pub async fn seeded_store(docs: &[(&str, &str)]) -> InMemoryDocumentStore {
    let store = InMemoryDocumentStore::new();
    for (path, text) in docs {
        store.insert_document(path, text).await;
    }
    store
}

/// Metadata block with a `prev` reference
pub fn with_prev(reference: &str) -> String {
    format!("---\nprev: \"[[{}]]\"\n---\n", reference)
}

/// Metadata block with a `prev` reference and main-thread marker
pub fn with_prev_main(reference: &str, is_main: bool) -> String {
    format!(
        "---\nprev: \"[[{}]]\"\nmain_thread: {}\n---\n",
        reference, is_main
    )
}

/// Counts notifications
#[derive(Debug, Clone, Default)]
pub struct NotifyCounter(Arc<AtomicUsize>);

impl NotifyCounter {
    pub fn callback(&self) -> NotifyCallback {
        let counter = self.0.clone();
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// In-memory store that can be told to reject operations
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: InMemoryDocumentStore,
    pub fail_writes: AtomicBool,
    pub fail_creates: AtomicBool,
    pub unreadable: HashSet<String>,
}

impl FlakyStore {
    pub fn new(inner: InMemoryDocumentStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn with_unreadable(mut self, path: &str) -> Self {
        self.unreadable.insert(path.to_string());
        self
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn read(&self, path: &str) -> DocumentStoreResult<String> {
        if self.unreadable.contains(path) {
            return Err(DocumentStoreError::BackendError(anyhow::anyhow!(
                "read rejected: {}",
                path
            )));
        }
        self.inner.read(path).await
    }

    async fn write(&self, path: &str, text: &str) -> DocumentStoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DocumentStoreError::BackendError(anyhow::anyhow!(
                "write rejected: {}",
                path
            )));
        }
        self.inner.write(path, text).await
    }

    async fn create(&self, path: &str, text: &str) -> DocumentStoreResult<()> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(DocumentStoreError::BackendError(anyhow::anyhow!(
                "create rejected: {}",
                path
            )));
        }
        self.inner.create(path, text).await
    }

    async fn exists(&self, path: &str) -> DocumentStoreResult<bool> {
        self.inner.exists(path).await
    }

    async fn list_all(&self) -> DocumentStoreResult<Vec<String>> {
        self.inner.list_all().await
    }

    async fn create_folder(&self, path: &str) -> DocumentStoreResult<()> {
        self.inner.create_folder(path).await
    }
}
