// sentinel-core/src/domain/detection/temporal.rs

use tracing::debug;

use super::AnomalyDetector;
use crate::domain::error::DomainError;
use crate::domain::quality::{Anomaly, AnomalyType, Severity};
use crate::domain::snapshot::{Snapshot, Value};

const STRATEGY: &str = "Temporal";
const SIGMA_BAND: f64 = 3.0;
const ZERO_STDDEV: f64 = 1e-9;

impl AnomalyDetector {
    /// Flags values that break away from their trailing window.
    ///
    /// Rows are stable-sorted by `time_column`. The window of a row is the
    /// `window_size` rows ending at it; the first `window_size - 1` rows have
    /// no complete window and are never flagged. The row is compared against
    /// the mean and population standard deviation of the window rows that
    /// precede it, and flagged when it falls outside `mean ± 3·stddev`.
    pub fn detect_temporal(
        snapshot: &Snapshot,
        table_name: &str,
        time_column: &str,
        value_column: &str,
        window_size: usize,
    ) -> Result<Vec<Anomaly>, DomainError> {
        if window_size < 2 {
            return Err(DomainError::InvalidParameter(format!(
                "window_size must be at least 2, got {}",
                window_size
            )));
        }
        let (Some(time_idx), Some(value_idx)) = (
            snapshot.column_index(time_column),
            snapshot.column_index(value_column),
        ) else {
            debug!(time_column, value_column, "Temporal columns absent from snapshot, skipped");
            return Ok(Vec::new());
        };

        let rows = snapshot.rows();
        let mut order: Vec<usize> = (0..rows.len()).collect();
        order.sort_by(|a, b| rows[*a][time_idx].sort_cmp(&rows[*b][time_idx]));

        let series = order
            .iter()
            .map(|&i| match &rows[i][value_idx] {
                Value::Null => Ok(None),
                Value::Number(n) if n.is_finite() => Ok(Some(*n)),
                Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
                other => Err(DomainError::computation(
                    STRATEGY,
                    format!(
                        "column '{}' has non-numeric value '{}' at record {}",
                        value_column,
                        other,
                        snapshot.record_id(i)
                    ),
                )),
            })
            .collect::<Result<Vec<Option<f64>>, DomainError>>()?;

        let mut anomalies = Vec::new();
        for pos in (window_size - 1)..series.len() {
            let Some(value) = series[pos] else {
                continue;
            };
            let Some(history) = series[pos + 1 - window_size..pos]
                .iter()
                .copied()
                .collect::<Option<Vec<f64>>>()
            else {
                continue;
            };

            let n = history.len() as f64;
            let mean = history.iter().sum::<f64>() / n;
            let stddev = (history.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
            let lower = mean - SIGMA_BAND * stddev;
            let upper = mean + SIGMA_BAND * stddev;

            let severity = if stddev <= ZERO_STDDEV {
                if (value - mean).abs() <= ZERO_STDDEV {
                    continue;
                }
                Severity::Critical
            } else if value < lower || value > upper {
                Severity::from_deviation((value - mean).abs() / stddev)
            } else {
                continue;
            };

            anomalies.push(
                Anomaly::for_record(
                    table_name,
                    snapshot.record_id(order[pos]),
                    AnomalyType::Temporal,
                    format!(
                        "Temporal anomaly detected: {}={:.2}, Expected range: [{:.2}, {:.2}]",
                        value_column, value, lower, upper
                    ),
                    severity,
                )
                .with_column(value_column),
            );
        }

        Ok(anomalies)
    }
}
