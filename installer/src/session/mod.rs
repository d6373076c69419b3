//! Session state persistence.
//!
//! The engine never holds session state between calls; every render/submit loads the
//! blob from a `SessionStore`, mutates it, and writes it back. Keys are namespaced so a
//! store shared with unrelated data cannot collide with wizard sessions.
//!
//! Concurrent requests for the same session id are unsupported: stores provide atomic
//! `get`/`put` per call, not a read-modify-write transaction.

use crate::error::StoreError;
use crate::models::SessionState;

pub mod file;
pub mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

/// Prefix applied to every session key.
pub const SESSION_NAMESPACE: &str = "install_wizard";

pub trait SessionStore: Send + Sync {
    fn get(&self, session_id: &str) -> Result<Option<SessionState>, StoreError>;
    fn put(&self, session_id: &str, state: &SessionState) -> Result<(), StoreError>;
    /// Remove the session. Deleting a missing session is not an error.
    fn delete(&self, session_id: &str) -> Result<(), StoreError>;
}

/// Session ids are opaque tokens; only `[A-Za-z0-9_-]{1,128}` is accepted so ids can be
/// used as file names without escaping.
pub fn validate_session_id(session_id: &str) -> Result<(), StoreError> {
    let ok = !session_id.is_empty()
        && session_id.len() <= 128
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidId(session_id.to_string()))
    }
}

pub fn namespaced_key(session_id: &str) -> Result<String, StoreError> {
    validate_session_id(session_id)?;
    Ok(format!("{}.{}", SESSION_NAMESPACE, session_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaced_key_prefixes_id() {
        assert_eq!(
            namespaced_key("abc-123").unwrap(),
            "install_wizard.abc-123"
        );
    }

    #[test]
    fn rejects_path_like_and_empty_ids() {
        for bad in ["", "../etc/passwd", "a/b", "a b", "x.y"] {
            assert!(
                validate_session_id(bad).is_err(),
                "id '{}' should be rejected",
                bad
            );
        }
        assert!(validate_session_id(&"a".repeat(129)).is_err());
    }
}
