use async_trait::async_trait;

use crate::application::errors::StorageError;
use crate::domain::entities::Accounts;

/// Store trait - durable snapshot of every account
#[async_trait]
pub trait Store: Send + Sync {
    /// Read the snapshot. A missing snapshot is an empty map, a malformed one is `Corrupt`.
    async fn load(&self) -> Result<Accounts, StorageError>;

    /// Replace the snapshot. Must never leave a half-written snapshot behind.
    async fn save(&self, accounts: &Accounts) -> Result<(), StorageError>;
}
