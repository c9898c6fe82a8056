use crate::error::StorageError;
use crate::story::Record;
use async_trait::async_trait;

/// Persistence seam for domain records, keyed by string ids.
#[async_trait]
pub trait Repository<T: Record>: Send + Sync {
    /// Insert or replace a record; returns the stored representation.
    async fn save(&self, record: &T) -> Result<T, StorageError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<T>, StorageError>;

    /// All records, newest first.
    async fn list(&self) -> Result<Vec<T>, StorageError>;

    /// Records whose `column` equals `value`, newest first.
    async fn list_by(&self, column: &str, value: &str) -> Result<Vec<T>, StorageError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: &str) -> Result<bool, StorageError>;
}
