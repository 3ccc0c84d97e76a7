// Persistence replica of the tracker; sqlite implementation lives in `sqlite`

mod sqlite;
mod write_through;

pub use sqlite::SeaOrmProgressStore;
pub use write_through::WriteThrough;

use crate::domain::{ProgressKey, ReadProgress, ReadProgressRecord};

#[async_trait::async_trait]
pub trait ProgressStore: Send + Sync {
    /// Every persisted row, as replica records to be reconciled into a tracker.
    async fn load_all(&self) -> anyhow::Result<Vec<ReadProgressRecord>>;
    /// Insert or overwrite the row of the record's key. A row already holding
    /// a newer `updated_at` is left alone.
    async fn upsert(&self, progress: &ReadProgress) -> anyhow::Result<()>;
    /// Returns whether a row was deleted.
    async fn delete(&self, key: &ProgressKey) -> anyhow::Result<bool>;
}
