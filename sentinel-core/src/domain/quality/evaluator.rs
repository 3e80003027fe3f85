// sentinel-core/src/domain/quality/evaluator.rs

use chrono::Utc;
use std::collections::HashSet;
use tracing::debug;

use crate::domain::quality::anomaly::{Anomaly, AnomalyType};
use crate::domain::quality::metric::{Metric, MetricStatus, MetricType};
use crate::domain::quality::rule::{Rule, RuleKind};
use crate::domain::snapshot::{Snapshot, Value};

/// Applies quality rules to a snapshot.
pub struct MetricEvaluator;

impl MetricEvaluator {
    /// Evaluates every rule bound to `table_name` against the snapshot.
    ///
    /// Returns one metric per evaluated rule and one anomaly per failed
    /// metric. Rules for other tables, or for columns the snapshot does not
    /// carry, produce nothing.
    pub fn evaluate(
        snapshot: &Snapshot,
        table_name: &str,
        rules: &[Rule],
    ) -> (Vec<Metric>, Vec<Anomaly>) {
        let mut metrics = Vec::new();
        let mut anomalies = Vec::new();

        for rule in rules.iter().filter(|r| r.applies_to(table_name)) {
            let Some(values) = snapshot.column(&rule.column_name) else {
                debug!(
                    rule_id = rule.rule_id,
                    column = %rule.column_name,
                    "Column absent from snapshot, rule skipped"
                );
                continue;
            };
            let values: Vec<&Value> = values.collect();

            let ratio = Self::measure(&rule.kind, &values);
            let status = MetricStatus::evaluate(ratio, rule.threshold);
            let rule_type = rule.kind.rule_type();

            if status == MetricStatus::Failed {
                anomalies.push(Anomaly::for_column(
                    table_name,
                    &rule.column_name,
                    AnomalyType::from(rule_type),
                    Self::describe(rule, ratio),
                    rule.severity,
                ));
            }

            metrics.push(Metric {
                rule_id: rule.rule_id,
                table_name: table_name.to_string(),
                column_name: rule.column_name.clone(),
                metric_type: MetricType::from(rule_type),
                metric_value: ratio,
                threshold_value: rule.threshold,
                status,
                measured_at: Utc::now(),
            });
        }

        (metrics, anomalies)
    }

    /// Failing fraction of a column for one rule kind. Empty columns measure 0.
    pub fn measure(kind: &RuleKind, values: &[&Value]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let total = values.len() as f64;

        match kind {
            RuleKind::NullCheck => {
                values.iter().filter(|v| v.is_null()).count() as f64 / total
            }
            RuleKind::UniquenessCheck => {
                let distinct: HashSet<_> = values.iter().filter_map(|v| v.distinct_key()).collect();
                1.0 - distinct.len() as f64 / total
            }
            RuleKind::RangeCheck { min, max } => {
                let lo = min.unwrap_or(f64::NEG_INFINITY);
                let hi = max.unwrap_or(f64::INFINITY);
                values
                    .iter()
                    .filter_map(|v| v.as_f64())
                    .filter(|x| *x < lo || *x > hi)
                    .count() as f64
                    / total
            }
            RuleKind::PatternCheck { pattern } => {
                values
                    .iter()
                    .filter(|v| !pattern.is_match(&v.to_text()))
                    .count() as f64
                    / total
            }
        }
    }

    fn describe(rule: &Rule, ratio: f64) -> String {
        let pct = ratio * 100.0;
        let column = &rule.column_name;
        match &rule.kind {
            RuleKind::NullCheck => format!("Column {} has {:.2}% null values", column, pct),
            RuleKind::UniquenessCheck => {
                format!("Column {} has {:.2}% duplicate values", column, pct)
            }
            RuleKind::RangeCheck { min, max } => format!(
                "Column {} has {:.2}% values outside range [{}, {}]",
                column,
                pct,
                min.map_or_else(|| "-inf".to_string(), |v| v.to_string()),
                max.map_or_else(|| "inf".to_string(), |v| v.to_string()),
            ),
            RuleKind::PatternCheck { .. } => {
                format!("Column {} has {:.2}% values not matching pattern", column, pct)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::quality::rule::FullMatch;
    use crate::domain::quality::severity::Severity;

    const EMAIL: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

    fn rule(table: &str, column: &str, kind: RuleKind, threshold: f64) -> Rule {
        Rule {
            rule_id: 1,
            table_name: table.into(),
            column_name: column.into(),
            kind,
            threshold,
            severity: Severity::High,
        }
    }

    fn numbers(values: &[f64]) -> Vec<Value> {
        values.iter().map(|v| Value::from(*v)).collect()
    }

    #[test]
    fn test_pattern_check_scenario() {
        let snap = Snapshot::from_column("email", vec!["a@x.com".into(), "bad".into(), "c@y.com".into()]);
        let rules = [rule(
            "dim_customer",
            "email",
            RuleKind::PatternCheck {
                pattern: FullMatch::new(EMAIL).unwrap(),
            },
            0.0,
        )];

        let (metrics, anomalies) = MetricEvaluator::evaluate(&snap, "dim_customer", &rules);

        assert_eq!(metrics.len(), 1);
        assert!((metrics[0].metric_value - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(metrics[0].status, MetricStatus::Failed);
        assert_eq!(metrics[0].metric_type, MetricType::InvalidPatternRatio);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].anomaly_type, AnomalyType::InvalidPatterns);
        assert_eq!(anomalies[0].severity, Severity::High);
        insta::assert_snapshot!(
            &anomalies[0].description,
            @"Column email has 33.33% values not matching pattern"
        );
    }

    #[test]
    fn test_null_check_scenario_passes_under_threshold() {
        let mut values = numbers(&[1.0; 99]);
        values.push(Value::Null);
        let snap = Snapshot::from_column("customer_key", values);
        let rules = [rule("fact_transaction", "customer_key", RuleKind::NullCheck, 0.05)];

        let (metrics, anomalies) = MetricEvaluator::evaluate(&snap, "fact_transaction", &rules);

        assert_eq!(metrics[0].metric_value, 0.01);
        assert_eq!(metrics[0].status, MetricStatus::Passed);
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_null_ratio_is_exact_and_monotone() {
        let mut values = numbers(&[1.0, 2.0, 3.0, 4.0]);
        let kind = RuleKind::NullCheck;
        let mut previous = -1.0;
        for i in 0..=values.len() {
            if i > 0 {
                values[i - 1] = Value::Null;
            }
            let refs: Vec<&Value> = values.iter().collect();
            let ratio = MetricEvaluator::measure(&kind, &refs);
            assert_eq!(ratio, i as f64 / 4.0);
            assert!(ratio > previous);
            previous = ratio;
        }
    }

    #[test]
    fn test_threshold_boundary_is_passed() {
        let snap = Snapshot::from_column("c", vec![Value::Null, Value::from(1.0)]);
        let rules = [rule("t", "c", RuleKind::NullCheck, 0.5)];
        let (metrics, anomalies) = MetricEvaluator::evaluate(&snap, "t", &rules);
        assert_eq!(metrics[0].metric_value, 0.5);
        assert_eq!(metrics[0].status, MetricStatus::Passed);
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_uniqueness_on_empty_snapshot_passes() {
        let snap = Snapshot::from_column("transaction_id", vec![]);
        let rules = [rule("t", "transaction_id", RuleKind::UniquenessCheck, 0.0)];
        let (metrics, anomalies) = MetricEvaluator::evaluate(&snap, "t", &rules);
        assert_eq!(metrics[0].metric_value, 0.0);
        assert_eq!(metrics[0].status, MetricStatus::Passed);
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_uniqueness_counts_duplicates_and_nulls() {
        let snap = Snapshot::from_column(
            "id",
            vec![1.0.into(), 1.0.into(), 2.0.into(), Value::Null],
        );
        let rules = [rule("t", "id", RuleKind::UniquenessCheck, 0.0)];
        let (metrics, anomalies) = MetricEvaluator::evaluate(&snap, "t", &rules);
        // 2 distinct non-null values out of 4 rows
        assert_eq!(metrics[0].metric_value, 0.5);
        assert_eq!(anomalies[0].anomaly_type, AnomalyType::HighDuplicateRatio);
        insta::assert_snapshot!(&anomalies[0].description, @"Column id has 50.00% duplicate values");
    }

    #[test]
    fn test_range_check_scenario() {
        let mut values = numbers(&[250.0; 49]);
        values.push(Value::from(-10.0));
        let snap = Snapshot::from_column("amount", values);
        let rules = [rule(
            "fact_transaction",
            "amount",
            RuleKind::RangeCheck {
                min: Some(0.0),
                max: Some(1_000_000.0),
            },
            0.001,
        )];

        let (metrics, anomalies) = MetricEvaluator::evaluate(&snap, "fact_transaction", &rules);

        assert_eq!(metrics[0].metric_value, 0.02);
        assert_eq!(metrics[0].status, MetricStatus::Failed);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].anomaly_type, AnomalyType::OutOfRangeValues);
        assert_eq!(anomalies[0].column_name.as_deref(), Some("amount"));
        insta::assert_snapshot!(
            &anomalies[0].description,
            @"Column amount has 2.00% values outside range [0, 1000000]"
        );
    }

    #[test]
    fn test_range_ignores_nulls_and_text() {
        let snap = Snapshot::from_column(
            "amount",
            vec![Value::Null, "n/a".into(), 5.0.into(), 50.0.into()],
        );
        let kind = RuleKind::RangeCheck {
            min: None,
            max: Some(10.0),
        };
        let refs: Vec<&Value> = snap.column("amount").unwrap().collect();
        assert_eq!(MetricEvaluator::measure(&kind, &refs), 0.25);
    }

    #[test]
    fn test_missing_column_and_other_tables_are_skipped() {
        let snap = Snapshot::from_column("email", vec!["a@x.com".into()]);
        let rules = [
            rule("dim_customer", "phone", RuleKind::NullCheck, 0.0),
            rule("fact_transaction", "email", RuleKind::NullCheck, 0.0),
        ];
        let (metrics, anomalies) = MetricEvaluator::evaluate(&snap, "dim_customer", &rules);
        assert!(metrics.is_empty());
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_rule_severity_is_carried_verbatim() {
        let snap = Snapshot::from_column("c", vec![Value::Null]);
        let mut low = rule("t", "c", RuleKind::NullCheck, 0.0);
        low.severity = Severity::Low;
        let mut critical = rule("t", "c", RuleKind::NullCheck, 0.0);
        critical.severity = Severity::Critical;

        let (metrics, anomalies) = MetricEvaluator::evaluate(&snap, "t", &[low, critical]);
        assert_eq!(metrics[0].metric_value, metrics[1].metric_value);
        assert_eq!(anomalies[0].severity, Severity::Low);
        assert_eq!(anomalies[1].severity, Severity::Critical);
    }
}
