//! Filesystem storage for session credentials.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use farmhand_core::Result;
use farmhand_core::error::{Error, StorageError};
use farmhand_core::store::CredentialStore;
use farmhand_core::tokens::{AccessToken, CredentialPair, RefreshToken};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// On-disk layout of the credential file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCredentials {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    /// RFC 3339 timestamp of the last write.
    saved_at: String,
}

/// A JSON credential file that survives restarts.
///
/// Writes go to a uniquely named temporary file in the same directory which
/// is then renamed over the target, under an exclusive lock on a sibling
/// `.lock` file, so concurrent processes never observe a half-written pair.
/// On Unix the file is created with mode 0600.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store for the credential file at `path`.
    ///
    /// Nothing is touched on disk until the first save.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the credential file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn io_error(&self, err: std::io::Error) -> Error {
        StorageError::Io {
            path: self.path.display().to_string(),
            message: err.to_string(),
        }
        .into()
    }

    fn format_error(&self, err: serde_json::Error) -> Error {
        StorageError::Format {
            path: self.path.display().to_string(),
            message: err.to_string(),
        }
        .into()
    }

    /// Run `f` while holding the exclusive lock.
    fn locked<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|e| self.io_error(e))?;

        lock_file.lock_exclusive().map_err(|e| self.io_error(e))?;
        let result = f();
        lock_file.unlock().map_err(|e| self.io_error(e))?;

        result
    }

    fn read(&self) -> Result<Option<CredentialPair>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let stored: StoredCredentials =
            serde_json::from_str(&json).map_err(|e| self.format_error(e))?;

        Ok(Some(CredentialPair::new(
            AccessToken::new(stored.access_token),
            stored.refresh_token.map(RefreshToken::new),
        )))
    }

    fn write(&self, pair: &CredentialPair) -> Result<()> {
        let stored = StoredCredentials {
            access_token: pair.access.as_str().to_string(),
            refresh_token: pair.refresh.as_ref().map(|t| t.as_str().to_string()),
            saved_at: Utc::now().to_rfc3339(),
        };
        let json = serde_json::to_string_pretty(&stored).map_err(|e| self.format_error(e))?;

        let tmp_path = self
            .path
            .with_file_name(format!(".credentials.{}.tmp", Uuid::new_v4().simple()));

        let mut options = OpenOptions::new();
        options.create_new(true).write(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&tmp_path).map_err(|e| self.io_error(e))?;
        file.write_all(json.as_bytes())
            .map_err(|e| self.io_error(e))?;
        file.sync_data().map_err(|e| self.io_error(e))?;
        drop(file);

        #[cfg(unix)]
        {
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&tmp_path, perms).map_err(|e| self.io_error(e))?;
        }

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(self.io_error(e));
        }

        debug!(path = %self.path.display(), "Persisted credentials");
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Removed credentials");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Option<CredentialPair>> {
        self.read()
    }

    #[instrument(skip(self, pair), fields(path = %self.path.display()))]
    async fn save(&self, pair: &CredentialPair) -> Result<()> {
        self.locked(|| self.write(pair))
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn clear(&self) -> Result<()> {
        self.locked(|| self.remove())
    }
}
