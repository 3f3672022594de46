use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::Utc;
use tracing::instrument;

use crate::db::models::ScoreStore;
use crate::db::{StoreErr, StoreResult};

/// Flat-file persistence for the whole [`ScoreStore`].
///
/// There is no caching: every call goes back to the file, which stays the single source of
/// truth between operations.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the persisted store.
    ///
    /// A missing file is an empty store. A file that can't be decoded is also an empty store, see
    /// [`JsonStore::recover_malformed`]. Any other I/O failure is returned to the caller.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> StoreResult<ScoreStore> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("no score file yet, starting empty");
                return Ok(ScoreStore::new());
            }
            Err(e) => return Err(self.io_err(e)),
        };

        let parsed = std::str::from_utf8(&bytes)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str::<ScoreStore>(text).map_err(|e| e.to_string()));

        match parsed {
            Ok(store) => {
                tracing::trace!(chats = store.chats().count(), "loaded score file");
                Ok(store)
            }
            Err(reason) => Ok(self.recover_malformed(&bytes, &reason).await),
        }
    }

    /// Overwrites the persisted file with the full store.
    ///
    /// The JSON goes to a sibling temp file first and is then renamed over the target.
    #[instrument(skip(self, store), fields(path = %self.path.display()))]
    pub async fn save(&self, store: &ScoreStore) -> StoreResult<()> {
        let mut body = serde_json::to_string_pretty(store)?;
        body.push('\n');

        let tmp = self.sibling("tmp");
        tokio::fs::write(&tmp, body).await.map_err(|e| StoreErr::Io {
            path: tmp.clone(),
            source: e,
        })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_err(e))?;

        tracing::trace!("saved score file");
        Ok(())
    }

    /// Fallback for an unreadable score file: the bad file is copied aside (best effort) and an
    /// empty store is handed back so the bot keeps running.
    ///
    /// The next save overwrites the original path, so the copy is the only trace of the old data.
    /// Content that already has a backup is not copied again.
    #[instrument(skip(self, contents, reason))]
    async fn recover_malformed(&self, contents: &[u8], reason: &str) -> ScoreStore {
        if let Some(existing) = self.find_backup(contents).await {
            tracing::warn!(
                error = reason,
                backup = %existing.display(),
                "score file is still malformed, starting from an empty store"
            );
            return ScoreStore::new();
        }

        let backup = self.sibling(&format!("corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S")));

        match tokio::fs::copy(&self.path, &backup).await {
            Ok(_) => tracing::warn!(
                error = reason,
                backup = %backup.display(),
                "score file is malformed, starting from an empty store"
            ),
            Err(e) => tracing::error!(
                error = reason,
                backup_error = ?e,
                "score file is malformed and could not be backed up, starting from an empty store"
            ),
        }

        ScoreStore::new()
    }

    /// Looks for an earlier `.corrupt-*` copy holding exactly `contents`
    async fn find_backup(&self, contents: &[u8]) -> Option<PathBuf> {
        let prefix = self.sibling("corrupt-").file_name()?.to_os_string();
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut entries = tokio::fs::read_dir(&dir).await.ok()?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            if !name.as_encoded_bytes().starts_with(prefix.as_encoded_bytes()) {
                continue;
            }

            if tokio::fs::read(entry.path()).await.is_ok_and(|b| b == contents) {
                return Some(entry.path());
            }
        }

        None
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{suffix}"));

        self.path.with_file_name(name)
    }

    fn io_err(&self, source: std::io::Error) -> StoreErr {
        StoreErr::Io {
            path: self.path.clone(),
            source,
        }
    }
}
