//! File-based storage implementation

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::entities::Accounts;
use crate::domain::traits::Store;

/// JSON file-based store.
///
/// The file is one object mapping user id to
/// `{"balance": number, "bonus": bool, "referred_by": string|null}`.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create the parent directory if needed
    pub async fn init(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

/// Write `data` to `temp_path`, flush it, and rename it over `path`
async fn replace_file(temp_path: &Path, path: &Path, data: &[u8]) -> Result<(), StorageError> {
    let mut file = tokio::fs::File::create(temp_path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(temp_path, path).await?;
    sync_parent(path).await;
    Ok(())
}

/// Flush the directory entry so the rename survives a crash
#[cfg(unix)]
async fn sync_parent(path: &Path) {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match tokio::fs::File::open(parent).await {
        Ok(dir) => {
            if let Err(e) = dir.sync_all().await {
                tracing::warn!("Failed to sync {}: {}", parent.display(), e);
            }
        }
        Err(e) => tracing::warn!("Failed to open {} for sync: {}", parent.display(), e),
    }
}

#[cfg(not(unix))]
async fn sync_parent(_path: &Path) {}

/// Fill in the `id` field, which lives in the map key on disk
fn attach_ids(mut accounts: Accounts) -> Accounts {
    for (id, account) in accounts.iter_mut() {
        account.id = id.clone();
    }
    accounts
}

#[async_trait]
impl Store for JsonStore {
    async fn load(&self) -> Result<Accounts, StorageError> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No snapshot at {}, starting empty", self.path.display());
                return Ok(Accounts::new());
            }
            Err(e) => return Err(StorageError::Io(e)),
        };

        let accounts: Accounts = serde_json::from_slice(&data).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        Ok(attach_ids(accounts))
    }

    async fn save(&self, accounts: &Accounts) -> Result<(), StorageError> {
        let data = serde_json::to_vec_pretty(accounts)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        // Write to a sibling temp file, then rename over the snapshot
        let temp_path = self.temp_path();
        if let Err(e) = replace_file(&temp_path, &self.path, &data).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }

        tracing::debug!("Saved {} accounts to {}", accounts.len(), self.path.display());
        Ok(())
    }
}

/// In-memory store, nothing survives the process
#[derive(Default)]
pub struct MemoryStore {
    accounts: Arc<RwLock<Accounts>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last saved snapshot
    pub async fn snapshot(&self) -> Accounts {
        self.accounts.read().await.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load(&self) -> Result<Accounts, StorageError> {
        Ok(self.accounts.read().await.clone())
    }

    async fn save(&self, accounts: &Accounts) -> Result<(), StorageError> {
        let mut stored = self.accounts.write().await;
        *stored = accounts.clone();
        Ok(())
    }
}
