// sentinel-core/src/domain/detection/statistical.rs

use tracing::debug;

use super::AnomalyDetector;
use super::isolation_forest::{ForestParams, IsolationForest, percentile};
use crate::domain::error::DomainError;
use crate::domain::quality::{Anomaly, AnomalyType, Severity};
use crate::domain::snapshot::{Snapshot, Value};

const STRATEGY: &str = "Statistical";

impl AnomalyDetector {
    /// Flags multivariate outliers over `numeric_columns` with an isolation forest.
    ///
    /// `contamination` is the expected outlier fraction, in `(0, 0.5]`.
    /// Columns missing from the snapshot are ignored.
    pub fn detect_statistical(
        snapshot: &Snapshot,
        table_name: &str,
        numeric_columns: &[String],
        contamination: f64,
    ) -> Result<Vec<Anomaly>, DomainError> {
        Self::detect_statistical_with(
            snapshot,
            table_name,
            numeric_columns,
            contamination,
            &ForestParams::default(),
        )
    }

    pub fn detect_statistical_with(
        snapshot: &Snapshot,
        table_name: &str,
        numeric_columns: &[String],
        contamination: f64,
        params: &ForestParams,
    ) -> Result<Vec<Anomaly>, DomainError> {
        if !(contamination > 0.0 && contamination <= 0.5) {
            return Err(DomainError::InvalidParameter(format!(
                "contamination must be in (0, 0.5], got {}",
                contamination
            )));
        }

        let columns: Vec<(&str, usize)> = numeric_columns
            .iter()
            .filter_map(|c| match snapshot.column_index(c) {
                Some(idx) => Some((c.as_str(), idx)),
                None => {
                    debug!(column = %c, "Numeric column absent from snapshot, skipped");
                    None
                }
            })
            .collect();

        if columns.is_empty() || snapshot.is_empty() {
            return Ok(Vec::new());
        }

        let raw = numeric_matrix(snapshot, &columns)?;
        let scaled = standardize(&raw, &columns)?;

        let forest = IsolationForest::fit(&scaled, params);
        let scores: Vec<f64> = scaled.iter().map(|row| forest.score(row)).collect();
        let cutoff = percentile(&scores, 100.0 * (1.0 - contamination));

        let anomalies = scores
            .iter()
            .enumerate()
            .filter(|(_, s)| **s > cutoff)
            .map(|(i, s)| {
                let values = columns
                    .iter()
                    .zip(&raw[i])
                    .map(|((name, _), v)| format!("{}: {:.2}", name, v))
                    .collect::<Vec<_>>()
                    .join(", ");
                Anomaly::for_record(
                    table_name,
                    snapshot.record_id(i),
                    AnomalyType::Statistical,
                    format!("Statistical anomaly detected: {}", values),
                    Severity::from_isolation_score(*s),
                )
            })
            .collect();

        Ok(anomalies)
    }
}

fn numeric_matrix(snapshot: &Snapshot, columns: &[(&str, usize)]) -> Result<Vec<Vec<f64>>, DomainError> {
    snapshot
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            columns
                .iter()
                .map(|(name, idx)| match &row[*idx] {
                    Value::Number(n) if n.is_finite() => Ok(*n),
                    Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
                    other => Err(DomainError::computation(
                        STRATEGY,
                        format!(
                            "column '{}' has non-numeric value '{}' at record {}",
                            name,
                            other,
                            snapshot.record_id(i)
                        ),
                    )),
                })
                .collect::<Result<Vec<f64>, DomainError>>()
        })
        .collect()
}

/// Zero mean, unit variance per column. Constant columns become all zeros.
fn standardize(raw: &[Vec<f64>], columns: &[(&str, usize)]) -> Result<Vec<Vec<f64>>, DomainError> {
    let n = raw.len() as f64;
    let stats: Vec<(f64, f64)> = (0..columns.len())
        .map(|j| {
            let mean = raw.iter().map(|r| r[j]).sum::<f64>() / n;
            let var = raw.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / n;
            (mean, var.sqrt())
        })
        .collect();

    if let Some(((name, _), _)) = columns
        .iter()
        .zip(&stats)
        .find(|(_, (mean, std))| !mean.is_finite() || !std.is_finite())
    {
        return Err(DomainError::computation(
            STRATEGY,
            format!("column '{}' overflows mean or variance", name),
        ));
    }

    if stats.iter().all(|(_, std)| *std <= f64::EPSILON) {
        let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
        return Err(DomainError::computation(
            STRATEGY,
            format!("degenerate variance: columns {:?} are constant", names),
        ));
    }

    Ok(raw
        .iter()
        .map(|r| {
            r.iter()
                .zip(&stats)
                .map(|(x, (mean, std))| if *std > f64::EPSILON { (x - mean) / std } else { 0.0 })
                .collect()
        })
        .collect())
}
