// In-process session store (terminal mode, tests, single-process web deployments)

use chrono::{Duration, Utc};
use log::debug;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::StoreError;
use crate::models::SessionState;

use super::{namespaced_key, SessionStore};

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<HashMap<String, SessionState>>,
    /// Sessions idle longer than this are dropped whenever another session is written.
    idle_limit: Option<Duration>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that evicts abandoned sessions (web mode mints one per cookieless visitor).
    pub fn with_idle_limit(idle_limit: Duration) -> Self {
        Self {
            inner: Mutex::default(),
            idle_limit: Some(idle_limit),
        }
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, SessionState>>, StoreError> {
        self.inner.lock().map_err(|_| {
            StoreError::Unavailable(std::io::Error::new(
                std::io::ErrorKind::Other,
                "session store lock poisoned",
            ))
        })
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, session_id: &str) -> Result<Option<SessionState>, StoreError> {
        let key = namespaced_key(session_id)?;
        Ok(self.lock()?.get(&key).cloned())
    }

    fn put(&self, session_id: &str, state: &SessionState) -> Result<(), StoreError> {
        let key = namespaced_key(session_id)?;
        let mut sessions = self.lock()?;
        if let Some(limit) = self.idle_limit {
            let now = Utc::now();
            let before = sessions.len();
            sessions.retain(|k, s| *k == key || !s.is_expired(now, limit));
            let evicted = before - sessions.len();
            if evicted > 0 {
                debug!("Evicted {} idle session(s)", evicted);
            }
        }
        sessions.insert(key, state.clone());
        Ok(())
    }

    fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        let key = namespaced_key(session_id)?;
        self.lock()?.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete() {
        let store = MemorySessionStore::new();
        assert!(store.get("s1").unwrap().is_none());

        let mut state = SessionState::new(Utc::now());
        state.current_step = 2;
        store.put("s1", &state).unwrap();
        assert_eq!(store.get("s1").unwrap().unwrap().current_step, 2);
        assert!(store.get("s2").unwrap().is_none());

        store.delete("s1").unwrap();
        assert!(store.get("s1").unwrap().is_none());
        // Deleting twice is fine.
        store.delete("s1").unwrap();
    }

    #[test]
    fn idle_sessions_are_evicted_on_write() {
        let store = MemorySessionStore::with_idle_limit(Duration::seconds(60));
        let now = Utc::now();
        store
            .put("abandoned", &SessionState::new(now - Duration::seconds(61)))
            .unwrap();
        store.put("recent", &SessionState::new(now)).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert!(store.get("abandoned").unwrap().is_none());
        assert!(store.get("recent").unwrap().is_some());

        // The session being written survives even when its own timestamp is stale.
        store
            .put("recent", &SessionState::new(now - Duration::seconds(120)))
            .unwrap();
        assert!(store.get("recent").unwrap().is_some());
    }

    #[test]
    fn without_idle_limit_nothing_is_evicted() {
        let store = MemorySessionStore::new();
        let old = SessionState::new(Utc::now() - Duration::days(2));
        store.put("a", &old).unwrap();
        store.put("b", &SessionState::new(Utc::now())).unwrap();
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn invalid_id_is_rejected() {
        let store = MemorySessionStore::new();
        assert!(matches!(
            store.get("../x"),
            Err(StoreError::InvalidId(_))
        ));
    }
}
