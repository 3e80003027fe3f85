// sentinel-core/src/ports/sink.rs

use crate::domain::quality::{Anomaly, Metric};
use crate::error::SentinelError;
use async_trait::async_trait;

/// Durable destination of evaluation results.
///
/// Each call is one batch: it is recorded completely before returning, or
/// not at all.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn save_metrics(&self, metrics: &[Metric]) -> Result<(), SentinelError>;

    async fn save_anomalies(&self, anomalies: &[Anomaly]) -> Result<(), SentinelError>;
}
