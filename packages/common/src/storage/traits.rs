use async_trait::async_trait;

use super::error::StorageError;

/// Storage for uploaded document files.
///
/// Paths returned by [`FileStore::store`] are opaque keys; callers persist
/// them on the document and hand them back to `load` and `delete`.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store `data` under `subdirectory` and return the stored path.
    async fn store(
        &self,
        subdirectory: &str,
        file_name: &str,
        data: &[u8],
    ) -> Result<String, StorageError>;

    /// Read every byte of a stored file.
    async fn load(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Delete a stored file.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, path: &str) -> Result<bool, StorageError>;
}
