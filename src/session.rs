//! In-memory user state table.
//!
//! Every operation takes the lock, mutates and releases it before returning,
//! so the guard never lives across an `.await`.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    AwaitingDocument,
    Processing,
}

impl Stage {
    pub fn describe(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::AwaitingDocument => "waiting for a PDF",
            Stage::Processing => "processing a PDF",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserSession {
    pub stage: Stage,
    pub documents_processed: u32,
    pub last_document: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl UserSession {
    fn new() -> Self {
        Self {
            stage: Stage::Idle,
            documents_processed: 0,
            last_document: None,
            updated_at: Utc::now(),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<i64, UserSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i64, UserSession>> {
        // A panic elsewhere cannot leave a half-written session behind, so a poisoned map is still usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, user_id: i64) -> Option<UserSession> {
        self.lock().get(&user_id).cloned()
    }

    pub fn set_stage(&self, user_id: i64, stage: Stage) {
        let mut map = self.lock();
        let session = map.entry(user_id).or_insert_with(UserSession::new);
        session.stage = stage;
        session.touch();
    }

    /// Moves the user to `Processing` unless a document is already in flight.
    pub fn try_begin_processing(&self, user_id: i64) -> bool {
        let mut map = self.lock();
        let session = map.entry(user_id).or_insert_with(UserSession::new);
        if session.stage == Stage::Processing {
            return false;
        }
        session.stage = Stage::Processing;
        session.touch();
        true
    }

    pub fn finish_processing(&self, user_id: i64, file_name: Option<&str>, succeeded: bool) {
        let mut map = self.lock();
        let session = map.entry(user_id).or_insert_with(UserSession::new);
        session.stage = Stage::Idle;
        if succeeded {
            session.documents_processed += 1;
            session.last_document = file_name.map(str::to_string);
        }
        session.touch();
    }

    pub fn reset(&self, user_id: i64) -> bool {
        self.lock().remove(&user_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops sessions untouched for longer than `older_than`. In-flight sessions are kept.
    pub fn evict_idle(&self, older_than: Duration) -> usize {
        let cutoff = Utc::now() - older_than;
        let mut map = self.lock();
        let before = map.len();
        map.retain(|_, session| session.stage == Stage::Processing || session.updated_at >= cutoff);
        let evicted = before - map.len();
        if evicted > 0 {
            debug!(evicted, remaining = map.len(), "Evicted idle sessions");
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_stage_creates_session() {
        let store = SessionStore::new();
        assert!(store.get(1).is_none());
        store.set_stage(1, Stage::AwaitingDocument);
        let session = store.get(1).unwrap();
        assert_eq!(session.stage, Stage::AwaitingDocument);
        assert_eq!(session.documents_processed, 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_processing_is_exclusive() {
        let store = SessionStore::new();
        assert!(store.try_begin_processing(7));
        assert!(!store.try_begin_processing(7));
        assert!(store.try_begin_processing(8));

        store.finish_processing(7, Some("a.pdf"), true);
        let session = store.get(7).unwrap();
        assert_eq!(session.stage, Stage::Idle);
        assert_eq!(session.documents_processed, 1);
        assert_eq!(session.last_document.as_deref(), Some("a.pdf"));
        assert!(store.try_begin_processing(7));
    }

    #[test]
    fn test_failed_processing_keeps_counters() {
        let store = SessionStore::new();
        assert!(store.try_begin_processing(3));
        store.finish_processing(3, Some("broken.pdf"), false);
        let session = store.get(3).unwrap();
        assert_eq!(session.stage, Stage::Idle);
        assert_eq!(session.documents_processed, 0);
        assert!(session.last_document.is_none());
    }

    #[test]
    fn test_reset() {
        let store = SessionStore::new();
        assert!(!store.reset(5));
        store.set_stage(5, Stage::AwaitingDocument);
        assert!(store.reset(5));
        assert!(store.is_empty());
    }

    #[test]
    fn test_mutation_refreshes_timestamp() {
        let store = SessionStore::new();
        store.set_stage(9, Stage::Idle);
        let first = store.get(9).unwrap().updated_at;
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.set_stage(9, Stage::AwaitingDocument);
        assert!(store.get(9).unwrap().updated_at > first);
    }

    #[test]
    fn test_evict_idle_keeps_processing() {
        let store = SessionStore::new();
        store.set_stage(1, Stage::AwaitingDocument);
        store.set_stage(2, Stage::Idle);
        assert!(store.try_begin_processing(3));

        assert_eq!(store.evict_idle(Duration::hours(1)), 0);
        assert_eq!(store.len(), 3);

        assert_eq!(store.evict_idle(Duration::seconds(-1)), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(3).unwrap().stage, Stage::Processing);
    }

    #[test]
    fn test_clones_share_state() {
        let store = SessionStore::new();
        let other = store.clone();
        other.set_stage(11, Stage::AwaitingDocument);
        assert_eq!(store.get(11).unwrap().stage, Stage::AwaitingDocument);
    }
}
