// sentinel-core/src/infrastructure/adapters/memory.rs

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::domain::quality::{Anomaly, Metric};
use crate::error::SentinelError;
use crate::ports::PersistenceSink;

/// Keeps persisted batches in memory. Used for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    metrics: Arc<Mutex<Vec<Metric>>>,
    anomalies: Arc<Mutex<Vec<Anomaly>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> Vec<Metric> {
        self.metrics.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn anomalies(&self) -> Vec<Anomaly> {
        self.anomalies.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PersistenceSink for MemorySink {
    async fn save_metrics(&self, metrics: &[Metric]) -> Result<(), SentinelError> {
        self.metrics
            .lock()
            .map_err(|_| SentinelError::Persistence {
                batch: "metrics",
                reason: "memory sink lock poisoned".into(),
            })?
            .extend_from_slice(metrics);
        Ok(())
    }

    async fn save_anomalies(&self, anomalies: &[Anomaly]) -> Result<(), SentinelError> {
        self.anomalies
            .lock()
            .map_err(|_| SentinelError::Persistence {
                batch: "anomalies",
                reason: "memory sink lock poisoned".into(),
            })?
            .extend_from_slice(anomalies);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::quality::{AnomalyType, Severity};

    #[tokio::test]
    async fn test_clones_share_storage() {
        let sink = MemorySink::new();
        let writer = sink.clone();
        writer
            .save_anomalies(&[Anomaly::for_record(
                "t",
                "1".into(),
                AnomalyType::Statistical,
                "x".into(),
                Severity::High,
            )])
            .await
            .unwrap();
        assert_eq!(sink.anomalies().len(), 1);
        assert!(sink.metrics().is_empty());
    }
}
