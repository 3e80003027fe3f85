// sentinel-core/src/domain/detection/pattern.rs

use std::collections::BTreeMap;
use tracing::debug;

use super::AnomalyDetector;
use crate::domain::error::DomainError;
use crate::domain::quality::{Anomaly, AnomalyType, FullMatch, Severity};
use crate::domain::snapshot::Snapshot;

const STRATEGY: &str = "Pattern";

impl AnomalyDetector {
    /// Flags every non-null cell that does not fully match its column's pattern.
    ///
    /// Columns are visited in name order, rows in snapshot order. Columns the
    /// snapshot does not carry are skipped.
    pub fn detect_pattern(
        snapshot: &Snapshot,
        table_name: &str,
        column_patterns: &BTreeMap<String, String>,
    ) -> Result<Vec<Anomaly>, DomainError> {
        let mut anomalies = Vec::new();

        for (column, raw) in column_patterns {
            let Some(idx) = snapshot.column_index(column) else {
                debug!(column = %column, "Pattern column absent from snapshot, skipped");
                continue;
            };
            let pattern = FullMatch::new(raw).map_err(|e| {
                DomainError::computation(
                    STRATEGY,
                    format!("invalid pattern for column '{}': {}", column, e),
                )
            })?;

            for (row, cells) in snapshot.rows().iter().enumerate() {
                let cell = &cells[idx];
                if cell.is_null() {
                    continue;
                }
                let text = cell.to_text();
                if pattern.is_match(&text) {
                    continue;
                }
                anomalies.push(
                    Anomaly::for_record(
                        table_name,
                        snapshot.record_id(row),
                        AnomalyType::Pattern,
                        format!("Pattern mismatch in column {}: {}", column, text),
                        Severity::Medium,
                    )
                    .with_column(column),
                );
            }
        }

        Ok(anomalies)
    }
}
