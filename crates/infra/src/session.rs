//! Session persistence
//!
//! [`FileTokenStore`] keeps the single session record as pretty JSON in the
//! per-user data directory. Writes go to a temporary file in the same
//! directory which is then renamed over the destination, so readers see
//! either the old record or the new one. Loading fails soft: anything
//! unreadable is logged and treated as "no session".
//!
//! [`TestModeTokenStore`] backs test mode and never touches the disk.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use raidassist_common::auth::{TokenRecord, TokenStore};
use raidassist_common::Clock;
use raidassist_domain::AuthError;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// JSON session file with atomic replace.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and check the session file.
    ///
    /// # Errors
    /// [`AuthError::SessionCorrupt`] when the file exists but cannot be read
    /// or does not hold a usable record.
    pub fn read_record(path: &Path) -> Result<Option<TokenRecord>, AuthError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AuthError::SessionCorrupt(format!("unreadable: {e}"))),
        };

        let record: TokenRecord = serde_json::from_str(&contents)
            .map_err(|e| AuthError::SessionCorrupt(format!("invalid JSON: {e}")))?;
        if record.access_token.trim().is_empty() {
            return Err(AuthError::SessionCorrupt("empty access_token".to_string()));
        }
        Ok(Some(record))
    }

    /// Write the record atomically, creating parent directories.
    ///
    /// # Errors
    /// [`AuthError::Storage`] on any filesystem failure.
    pub fn write_record(path: &Path, record: &TokenRecord) -> Result<(), AuthError> {
        let storage = |context: &str, e: &dyn std::fmt::Display| {
            AuthError::Storage(format!("{context} {}: {e}", path.display()))
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| storage("failed to create directory for", &e))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| storage("failed to stage", &e))?;
        serde_json::to_writer_pretty(&mut tmp, record).map_err(|e| storage("failed to encode", &e))?;
        tmp.write_all(b"\n").map_err(|e| storage("failed to write", &e))?;
        tmp.as_file().sync_all().map_err(|e| storage("failed to sync", &e))?;
        tmp.persist(path).map_err(|e| storage("failed to replace", &e.error))?;
        Ok(())
    }

    fn remove(path: &Path) -> Result<bool, AuthError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AuthError::Storage(format!("failed to remove {}: {e}", path.display()))),
        }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Option<TokenRecord> {
        let path = self.path.clone();
        let result = tokio::task::spawn_blocking(move || Self::read_record(&path)).await;

        match result {
            Ok(Ok(Some(record))) => {
                debug!(path = %self.path.display(), "session_loaded");
                Some(record)
            }
            Ok(Ok(None)) => {
                debug!(path = %self.path.display(), "session_absent");
                None
            }
            Ok(Err(e)) => {
                warn!(path = %self.path.display(), error = %e, "session_unusable");
                None
            }
            Err(e) => {
                warn!(error = %e, "session_load_task_failed");
                None
            }
        }
    }

    async fn save(&self, record: &TokenRecord) -> Result<(), AuthError> {
        let path = self.path.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || Self::write_record(&path, &record))
            .await
            .map_err(|e| AuthError::Storage(format!("session save task failed: {e}")))??;
        debug!(path = %self.path.display(), "session_saved");
        Ok(())
    }

    async fn clear(&self) -> Result<(), AuthError> {
        let path = self.path.clone();
        let removed = tokio::task::spawn_blocking(move || Self::remove(&path))
            .await
            .map_err(|e| AuthError::Storage(format!("session clear task failed: {e}")))??;
        if removed {
            info!(path = %self.path.display(), "session_cleared");
        }
        Ok(())
    }
}

/// Store used while test mode is active.
///
/// `load` returns a synthetic record carrying the test token; `save` and
/// `clear` do nothing.
#[derive(Clone)]
pub struct TestModeTokenStore {
    token: String,
    clock: Arc<dyn Clock>,
}

impl TestModeTokenStore {
    pub fn new(token: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self { token: token.into(), clock }
    }
}

impl std::fmt::Debug for TestModeTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestModeTokenStore").field("token", &"[REDACTED]").finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenStore for TestModeTokenStore {
    async fn load(&self) -> Option<TokenRecord> {
        Some(TokenRecord::new(self.token.clone(), self.clock.now() + Duration::days(1)))
    }

    async fn save(&self, _record: &TokenRecord) -> Result<(), AuthError> {
        Ok(())
    }

    async fn clear(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for session.
    use raidassist_common::testing::MockClock;
    use tempfile::TempDir;

    use super::*;

    fn record() -> TokenRecord {
        let expires_at = "2030-01-01T12:00:00Z".parse().unwrap();
        TokenRecord::new("access", expires_at).with_refresh_token("refresh")
    }

    #[test]
    fn test_write_then_read_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.json");

        FileTokenStore::write_record(&path, &record()).unwrap();
        let loaded = FileTokenStore::read_record(&path).unwrap().unwrap();
        assert_eq!(loaded, record());
    }

    #[test]
    fn test_empty_access_token_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            r#"{"access_token":"","refresh_token":null,"expires_at":"2030-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        let err = FileTokenStore::read_record(&path).unwrap_err();
        assert!(matches!(err, AuthError::SessionCorrupt(ref msg) if msg.contains("access_token")));
    }

    #[tokio::test]
    async fn test_mode_store_returns_synthetic_record() {
        let clock = MockClock::new();
        let store = TestModeTokenStore::new("test_token", Arc::new(clock.clone()));

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.access_token, "test_token");
        assert_eq!(loaded.expires_at, clock.now() + Duration::days(1));
        assert!(store.save(&record()).await.is_ok());
        assert!(store.clear().await.is_ok());
        assert!(!format!("{store:?}").contains("test_token"));
    }
}
