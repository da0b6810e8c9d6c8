//! File-backed and in-memory key-value repositories.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Key under which the raw bearer token is persisted.
pub const TOKEN_KEY: &str = "token";

/// Minimal synchronous key-value store, the client-side equivalent of browser local storage.
pub trait KeyValueRepository: Send + Sync {
    /// Read an entry. A missing key is `Ok(None)`.
    fn get(&self, key: &str) -> ClientResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> ClientResult<()>;
    /// Remove an entry. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> ClientResult<()>;
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileRepository {
    dir: PathBuf,
}

impl FileRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, key: &str) -> ClientResult<PathBuf> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(ClientError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

impl KeyValueRepository for FileRepository {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw.trim_end_matches(['\r', '\n']).to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let path = self.entry_path(key)?;
        fs::create_dir_all(&self.dir)?;

        // Write beside the target and rename so readers never see a torn value.
        let tmp = self.dir.join(format!(".{key}.tmp"));
        {
            let mut file = open_private(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        debug!(key = %key, path = %path.display(), "entry stored");
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(key = %key, "entry removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
    fs::File::create(path)
}

/// In-process repository for ephemeral sessions; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-seeded with a token, as if left behind by an earlier run.
    pub fn with_token(token: &str) -> Self {
        let repo = Self::new();
        repo.lock().insert(TOKEN_KEY.to_string(), token.to_string());
        repo
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueRepository for MemoryRepository {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_repository_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRepository::new(dir.path().join("nested"));

        assert_eq!(repo.get(TOKEN_KEY).unwrap(), None);
        repo.set(TOKEN_KEY, "tok123").unwrap();
        assert_eq!(repo.get(TOKEN_KEY).unwrap().as_deref(), Some("tok123"));

        repo.set(TOKEN_KEY, "tok456").unwrap();
        assert_eq!(repo.get(TOKEN_KEY).unwrap().as_deref(), Some("tok456"));

        repo.remove(TOKEN_KEY).unwrap();
        assert_eq!(repo.get(TOKEN_KEY).unwrap(), None);
        repo.remove(TOKEN_KEY).unwrap();
    }

    #[test]
    fn file_repository_ignores_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TOKEN_KEY), "hand-edited\n").unwrap();
        let repo = FileRepository::new(dir.path());
        assert_eq!(repo.get(TOKEN_KEY).unwrap().as_deref(), Some("hand-edited"));
    }

    #[test]
    fn file_repository_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRepository::new(dir.path());
        for key in ["", "..", "../token", "a/b", "a\\b"] {
            assert!(matches!(repo.set(key, "x"), Err(ClientError::InvalidKey(_))), "{key}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn file_repository_writes_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRepository::new(dir.path());
        repo.set(TOKEN_KEY, "secret").unwrap();
        let mode = std::fs::metadata(dir.path().join(TOKEN_KEY))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn memory_repository_roundtrip() {
        let repo = MemoryRepository::with_token("abc");
        assert_eq!(repo.get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));
        repo.remove(TOKEN_KEY).unwrap();
        assert_eq!(repo.get(TOKEN_KEY).unwrap(), None);
    }
}
