//! Session storage.
//!
//! Sessions are keyed by `SessionId` and wrapped in a per-session mutex so
//! one caller's tool loop never interleaves with another request for the
//! same session. The engine uses `try_lock` on that mutex to reject
//! concurrent requests instead of queueing them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use tabchat_common::SessionId;

use crate::session::Session;

pub type SharedSession = Arc<Mutex<Session>>;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, id: &SessionId) -> Option<SharedSession>;
    /// Insert (or replace) the session for this id.
    async fn insert(&self, id: SessionId, session: Session) -> SharedSession;
    async fn remove(&self, id: &SessionId) -> bool;
    async fn len(&self) -> usize;
}

/// Process-local store backed by a `HashMap`.
#[derive(Default)]
pub struct InMemorySessionStore {
    inner: RwLock<HashMap<SessionId, SharedSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: &SessionId) -> Option<SharedSession> {
        self.inner.read().await.get(id).cloned()
    }

    async fn insert(&self, id: SessionId, session: Session) -> SharedSession {
        let shared = Arc::new(Mutex::new(session));
        self.inner.write().await.insert(id, shared.clone());
        shared
    }

    async fn remove(&self, id: &SessionId) -> bool {
        self.inner.write().await.remove(id).is_some()
    }

    async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use tabchat_data::DatasetHandle;

    fn sample_session(filename: &str) -> Session {
        let a = Series::new("a".into(), &[1i64, 2]);
        let df = DataFrame::new(vec![a.into_column()]).unwrap();
        Session::new(DatasetHandle::new(df), filename)
    }

    #[tokio::test]
    async fn insert_get_remove() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();

        assert!(store.get(&id).await.is_none());
        store.insert(id.clone(), sample_session("a.csv")).await;
        assert_eq!(store.len().await, 1);

        let shared = store.get(&id).await.unwrap();
        assert_eq!(shared.lock().await.filename(), "a.csv");

        assert!(store.remove(&id).await);
        assert!(!store.remove(&id).await);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn insert_replaces_existing_session() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();
        store.insert(id.clone(), sample_session("old.csv")).await;
        store.insert(id.clone(), sample_session("new.csv")).await;

        assert_eq!(store.len().await, 1);
        let shared = store.get(&id).await.unwrap();
        assert_eq!(shared.lock().await.filename(), "new.csv");
    }
}
