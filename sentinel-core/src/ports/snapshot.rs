// sentinel-core/src/ports/snapshot.rs

use crate::domain::snapshot::Snapshot;
use crate::error::SentinelError;
use async_trait::async_trait;

#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Full read of a named table.
    async fn fetch_snapshot(&self, table_name: &str) -> Result<Snapshot, SentinelError>;
}
