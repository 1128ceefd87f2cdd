//! Session storage.
//!
//! `SessionStore` is the seam for swapping in a persistent backend.
//! `InMemorySessionStore` is process-local: a restart loses every interview.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::interview::models::{Session, SessionId};

/// Exclusive access to one session. Mutations are visible once the guard drops.
pub type SessionGuard = OwnedMutexGuard<Session>;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: Session);

    /// A point-in-time copy, for read-only views.
    async fn get(&self, id: SessionId) -> Option<Session>;

    /// Exclusive access for read-modify-write sequences. Concurrent checkouts of
    /// the same session wait for each other; different sessions never contend.
    async fn checkout(&self, id: SessionId) -> Option<SessionGuard>;

    async fn delete(&self, id: SessionId) -> bool;

    async fn len(&self) -> usize;
}

/// Map of per-session mutexes. The outer lock is held only to find a handle,
/// never while a session is checked out.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn handle(&self, id: SessionId) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: Session) {
        let id = session.id;
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
    }

    async fn get(&self, id: SessionId) -> Option<Session> {
        let handle = self.handle(id).await?;
        let session = handle.lock().await;
        Some(session.clone())
    }

    async fn checkout(&self, id: SessionId) -> Option<SessionGuard> {
        let handle = self.handle(id).await?;
        Some(handle.lock_owned().await)
    }

    async fn delete(&self, id: SessionId) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use uuid::Uuid;

    use super::*;
    use crate::interview::models::{Analysis, QnaRecord};

    fn session() -> Session {
        Session::new(vec!["Q1".to_string(), "Q2".to_string()], None)
    }

    #[tokio::test]
    async fn test_insert_get_delete() {
        let store = InMemorySessionStore::new();
        let session = session();
        let id = session.id;
        store.insert(session).await;

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(id).await.unwrap().questions().len(), 2);
        assert!(store.delete(id).await);
        assert!(store.get(id).await.is_none());
        assert!(!store.delete(id).await);
    }

    #[tokio::test]
    async fn test_unknown_id_has_no_checkout() {
        let store = InMemorySessionStore::new();
        assert!(store.checkout(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_checkout_mutations_persist() {
        let store = InMemorySessionStore::new();
        let session = session();
        let id = session.id;
        store.insert(session).await;

        {
            let mut guard = store.checkout(id).await.unwrap();
            guard.jump_to(1);
        }
        assert_eq!(store.get(id).await.unwrap().pointer(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_writers_on_same_session_do_not_lose_entries() {
        let store = Arc::new(InMemorySessionStore::new());
        let session = session();
        let id = session.id;
        store.insert(session).await;

        let mut tasks = Vec::new();
        for index in 0..2usize {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                let mut guard = store.checkout(id).await.unwrap();
                let snapshot = guard.clone();
                // Yield while holding the guard so an unsynchronised writer would interleave.
                tokio::time::sleep(Duration::from_millis(5)).await;
                let mut updated = snapshot;
                updated.record_answer(
                    index,
                    QnaRecord {
                        question: format!("Q{}", index + 1),
                        answer: "answer".to_string(),
                        analysis: Analysis::fallback(),
                    },
                );
                *guard = updated;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(store.get(id).await.unwrap().answered_indices(), vec![0, 1]);
    }
}
