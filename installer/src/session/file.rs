// File-backed session store
//
// One JSON blob per session: `<dir>/install_wizard.<id>.json`. Writes go to a temp file
// first and are renamed into place so a crash never leaves a half-written blob.

use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::models::SessionState;

use super::{namespaced_key, SessionStore};

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, session_id: &str) -> Result<PathBuf, StoreError> {
        Ok(self.dir.join(format!("{}.json", namespaced_key(session_id)?)))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, session_id: &str) -> Result<Option<SessionState>, StoreError> {
        let path = self.path_for(session_id)?;
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            warn!("Session blob {:?} could not be parsed: {}", path, e);
            StoreError::Corrupt {
                id: session_id.to_string(),
                reason: e.to_string(),
            }
        })
    }

    fn put(&self, session_id: &str, state: &SessionState) -> Result<(), StoreError> {
        let path = self.path_for(session_id)?;
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(state).map_err(|e| StoreError::Corrupt {
            id: session_id.to_string(),
            reason: e.to_string(),
        })?;
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        debug!("Persisted session blob {:?}", path);
        Ok(())
    }

    fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        let path = self.path_for(session_id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
