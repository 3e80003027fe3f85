// sentinel-core/src/application/orchestrator.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::detection::AnomalyDetector;
use crate::domain::entity::EntityConfig;
use crate::domain::quality::{Anomaly, Metric, MetricEvaluator, Rule, Severity};
use crate::domain::snapshot::Snapshot;
use crate::ports::{PersistenceSink, RuleSource};

/// Orchestration stages that can fail independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Snapshot,
    Rules,
    Statistical,
    Temporal,
    Pattern,
    PersistMetrics,
    PersistAnomalies,
    Internal,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snapshot => "snapshot",
            Self::Rules => "rules",
            Self::Statistical => "statistical",
            Self::Temporal => "temporal",
            Self::Pattern => "pattern",
            Self::PersistMetrics => "persist_metrics",
            Self::PersistAnomalies => "persist_anomalies",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub message: String,
}

/// Outcome of one entity run. Results stay here even when persistence fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub entity: String,
    pub table_name: String,
    pub row_count: usize,
    pub rules_evaluated: usize,
    pub metrics: Vec<Metric>,
    pub anomalies: Vec<Anomaly>,
    pub warnings: Vec<String>,
    pub failures: Vec<StageFailure>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl QualityReport {
    pub fn new(entity: &str, table_name: &str) -> Self {
        Self {
            entity: entity.to_string(),
            table_name: table_name.to_string(),
            row_count: 0,
            rules_evaluated: 0,
            metrics: Vec::new(),
            anomalies: Vec::new(),
            warnings: Vec::new(),
            failures: Vec::new(),
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    /// No stage failed. Failed metrics and anomalies do not count as failures.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_metrics(&self) -> impl Iterator<Item = &Metric> {
        self.metrics.iter().filter(|m| m.is_failed())
    }

    pub fn has_failed(&self, stage: Stage) -> bool {
        self.failures.iter().any(|f| f.stage == stage)
    }

    /// Anomaly count per severity, every tier present.
    pub fn severity_counts(&self) -> BTreeMap<Severity, usize> {
        let mut counts: BTreeMap<Severity, usize> = Severity::ALL.iter().map(|s| (*s, 0)).collect();
        for anomaly in &self.anomalies {
            *counts.entry(anomaly.severity).or_default() += 1;
        }
        counts
    }

    /// Records a stage failure and logs it.
    pub fn fail(&mut self, stage: Stage, message: impl Into<String>) {
        let message = message.into();
        error!(entity = %self.entity, stage = %stage, error = %message, "Stage failed");
        self.failures.push(StageFailure { stage, message });
    }
}

/// Runs the quality pipeline of one entity: rules, evaluation, detectors, persistence.
#[derive(Clone)]
pub struct QualityOrchestrator {
    rule_source: Arc<dyn RuleSource>,
    sink: Arc<dyn PersistenceSink>,
}

impl QualityOrchestrator {
    pub fn new(rule_source: Arc<dyn RuleSource>, sink: Arc<dyn PersistenceSink>) -> Self {
        Self { rule_source, sink }
    }

    /// Evaluates the snapshot and persists the results.
    #[instrument(skip_all, fields(entity = %entity.name, table = %entity.table))]
    pub async fn run(&self, entity: &EntityConfig, snapshot: Snapshot) -> QualityReport {
        let start = Instant::now();
        let mut report = self.evaluate(entity, snapshot).await;

        let failures = self.persist(&report).await;
        for failure in failures {
            report.fail(failure.stage, failure.message);
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            metrics = report.metrics.len(),
            anomalies = report.anomalies.len(),
            failures = report.failures.len(),
            "Entity run finished"
        );
        report
    }

    /// Evaluates the snapshot without touching the sink.
    pub async fn evaluate(&self, entity: &EntityConfig, snapshot: Snapshot) -> QualityReport {
        let start = Instant::now();
        let mut report = QualityReport::new(&entity.name, &entity.table);

        let snapshot = match &entity.id_column {
            Some(col) if snapshot.has_column(col) => snapshot.with_id_column(col),
            Some(col) => {
                report
                    .warnings
                    .push(format!("id column '{}' absent from snapshot, record ids are row positions", col));
                snapshot
            }
            None => snapshot,
        };
        report.row_count = snapshot.row_count();

        match self.load_rules(entity, &mut report).await {
            Some(rules) => {
                let (metrics, anomalies) = MetricEvaluator::evaluate(&snapshot, &entity.table, &rules);
                report.rules_evaluated = metrics.len();
                report.metrics = metrics;
                report.anomalies = anomalies;
            }
            None => debug!("Rule evaluation skipped"),
        }

        self.run_detectors(entity, &snapshot, &mut report);

        report.duration_ms = start.elapsed().as_millis() as u64;
        report
    }

    /// Sends the report's metrics then anomalies to the sink, one batch each.
    ///
    /// Empty batches are not sent. Returns the failed batches, so a caller
    /// can retry with the same report.
    pub async fn persist(&self, report: &QualityReport) -> Vec<StageFailure> {
        let mut failures = Vec::new();

        if !report.metrics.is_empty()
            && let Err(e) = self.sink.save_metrics(&report.metrics).await
        {
            failures.push(StageFailure {
                stage: Stage::PersistMetrics,
                message: e.to_string(),
            });
        }

        if !report.anomalies.is_empty()
            && let Err(e) = self.sink.save_anomalies(&report.anomalies).await
        {
            failures.push(StageFailure {
                stage: Stage::PersistAnomalies,
                message: e.to_string(),
            });
        }

        failures
    }

    async fn load_rules(&self, entity: &EntityConfig, report: &mut QualityReport) -> Option<Vec<Rule>> {
        let records = match self.rule_source.load_rules().await {
            Ok(records) => records,
            Err(e) => {
                report.fail(Stage::Rules, e.to_string());
                return None;
            }
        };

        let mut rules = Vec::new();
        for record in records
            .iter()
            .filter(|r| r.is_active && r.table_name == entity.table)
        {
            match Rule::try_from(record) {
                Ok(rule) => rules.push(rule),
                Err(e) => {
                    warn!(rule_id = record.rule_id, error = %e, "Rule skipped");
                    report.warnings.push(e.to_string());
                }
            }
        }
        debug!(count = rules.len(), "Rules loaded");
        Some(rules)
    }

    fn run_detectors(&self, entity: &EntityConfig, snapshot: &Snapshot, report: &mut QualityReport) {
        let table = entity.table.as_str();

        if !entity.numeric_columns.is_empty() {
            match AnomalyDetector::detect_statistical(
                snapshot,
                table,
                &entity.numeric_columns,
                entity.contamination,
            ) {
                Ok(found) => report.anomalies.extend(found),
                Err(e) => report.fail(Stage::Statistical, e.to_string()),
            }
        }

        if let Some(temporal) = &entity.temporal_analysis {
            match AnomalyDetector::detect_temporal(
                snapshot,
                table,
                &temporal.time_column,
                &temporal.value_column,
                temporal.window_size,
            ) {
                Ok(found) => report.anomalies.extend(found),
                Err(e) => report.fail(Stage::Temporal, e.to_string()),
            }
        }

        if !entity.pattern_checks.is_empty() {
            match AnomalyDetector::detect_pattern(snapshot, table, &entity.pattern_checks) {
                Ok(found) => report.anomalies.extend(found),
                Err(e) => report.fail(Stage::Pattern, e.to_string()),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entity::TemporalConfig;
    use crate::domain::quality::{AnomalyType, MetricStatus, RuleRecord};
    use crate::error::SentinelError;
    use crate::infrastructure::adapters::MemorySink;
    use crate::infrastructure::rule_store::RuleStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    const EMAIL: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

    struct FailingRules;

    #[async_trait]
    impl RuleSource for FailingRules {
        async fn load_rules(&self) -> Result<Vec<RuleRecord>, SentinelError> {
            Err(SentinelError::InternalError("rule store unreachable".into()))
        }
    }

    /// Records batches; can be switched to reject them.
    #[derive(Default)]
    struct FlakySink {
        reject: AtomicBool,
        calls: Mutex<Vec<(&'static str, usize)>>,
    }

    #[async_trait]
    impl PersistenceSink for FlakySink {
        async fn save_metrics(&self, metrics: &[Metric]) -> Result<(), SentinelError> {
            self.record("metrics", metrics.len())
        }

        async fn save_anomalies(&self, anomalies: &[Anomaly]) -> Result<(), SentinelError> {
            self.record("anomalies", anomalies.len())
        }
    }

    impl FlakySink {
        fn record(&self, batch: &'static str, len: usize) -> Result<(), SentinelError> {
            if self.reject.load(Ordering::SeqCst) {
                return Err(SentinelError::Persistence {
                    batch,
                    reason: "disk full".into(),
                });
            }
            self.calls.lock().unwrap().push((batch, len));
            Ok(())
        }
    }

    fn record(id: i64, column: &str, rule_type: &str, definition: serde_json::Value, threshold: f64) -> RuleRecord {
        RuleRecord {
            rule_id: id,
            table_name: "dim_customer".into(),
            column_name: column.into(),
            rule_type: rule_type.into(),
            rule_definition: definition.as_object().cloned().unwrap_or_default(),
            threshold,
            severity: "HIGH".into(),
            is_active: true,
        }
    }

    fn customers() -> Snapshot {
        Snapshot::new(
            vec!["customer_id".into(), "email".into(), "balance".into()],
            vec![
                vec!["C-1".into(), "a@x.com".into(), 100.0.into()],
                vec!["C-2".into(), "bad".into(), 120.0.into()],
                vec!["C-3".into(), "c@y.com".into(), "n/a".into()],
            ],
        )
        .unwrap()
    }

    fn customer_entity() -> EntityConfig {
        let mut entity = EntityConfig::new("customer", "dim_customer");
        entity.id_column = Some("customer_id".into());
        entity.pattern_checks.insert("email".into(), EMAIL.into());
        entity
    }

    fn orchestrator(rules: Vec<RuleRecord>, sink: Arc<dyn PersistenceSink>) -> QualityOrchestrator {
        QualityOrchestrator::new(Arc::new(RuleStore::new(rules)), sink)
    }

    #[tokio::test]
    async fn test_pattern_scenario_end_to_end() {
        let sink = MemorySink::new();
        let orch = orchestrator(
            vec![record(1, "email", "PATTERN_CHECK", json!({"pattern": EMAIL}), 0.0)],
            Arc::new(sink.clone()),
        );

        let report = orch.run(&customer_entity(), customers()).await;

        assert!(report.is_success(), "{:?}", report.failures);
        assert_eq!(report.row_count, 3);
        assert_eq!(report.metrics.len(), 1);
        assert!((report.metrics[0].metric_value - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.metrics[0].status, MetricStatus::Failed);
        assert_eq!(report.failed_metrics().count(), 1);

        let types: Vec<AnomalyType> = report.anomalies.iter().map(|a| a.anomaly_type).collect();
        assert_eq!(types, vec![AnomalyType::InvalidPatterns, AnomalyType::Pattern]);
        let pattern = &report.anomalies[1];
        assert_eq!(pattern.record_id.as_deref(), Some("C-2"));
        assert!(pattern.description.ends_with(": bad"));

        assert_eq!(sink.metrics().len(), 1);
        assert_eq!(sink.anomalies().len(), 2);
        assert_eq!(report.severity_counts()[&Severity::High], 1);
        assert_eq!(report.severity_counts()[&Severity::Medium], 1);
        assert_eq!(report.severity_counts()[&Severity::Low], 0);
    }

    #[tokio::test]
    async fn test_rule_source_failure_still_runs_detectors() {
        let sink = Arc::new(FlakySink::default());
        let orch = QualityOrchestrator::new(Arc::new(FailingRules), sink.clone());

        let report = orch.run(&customer_entity(), customers()).await;

        assert!(report.has_failed(Stage::Rules));
        assert!(report.metrics.is_empty());
        assert_eq!(report.anomalies.len(), 1);
        // no metrics batch is sent when there are no metrics
        assert_eq!(*sink.calls.lock().unwrap(), vec![("anomalies", 1)]);
    }

    #[tokio::test]
    async fn test_detector_failure_is_isolated() {
        let mut entity = customer_entity();
        entity.numeric_columns = vec!["balance".into()];
        entity.temporal_analysis = Some(TemporalConfig {
            time_column: "created_at".into(),
            value_column: "balance".into(),
            window_size: 2,
        });
        let orch = orchestrator(Vec::new(), Arc::new(MemorySink::new()));

        let report = orch.run(&entity, customers()).await;

        // "n/a" in balance breaks the statistical detector only
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, Stage::Statistical);
        assert!(report.failures[0].message.contains("Statistical detection failed"));
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].anomaly_type, AnomalyType::Pattern);
    }

    #[tokio::test]
    async fn test_failing_sink_keeps_results_and_retry_succeeds() {
        let sink = Arc::new(FlakySink::default());
        sink.reject.store(true, Ordering::SeqCst);
        let orch = orchestrator(
            vec![record(1, "email", "PATTERN_CHECK", json!({"pattern": EMAIL}), 0.0)],
            sink.clone(),
        );

        let report = orch.run(&customer_entity(), customers()).await;

        assert!(!report.is_success());
        assert!(report.has_failed(Stage::PersistMetrics));
        assert!(report.has_failed(Stage::PersistAnomalies));
        assert_eq!(report.metrics.len(), 1);
        assert_eq!(report.anomalies.len(), 2);

        sink.reject.store(false, Ordering::SeqCst);
        assert!(orch.persist(&report).await.is_empty());
        assert_eq!(*sink.calls.lock().unwrap(), vec![("metrics", 1), ("anomalies", 2)]);
    }

    #[tokio::test]
    async fn test_malformed_rules_become_warnings() {
        let mut inactive = record(4, "email", "NULL_CHECK", json!({}), 0.0);
        inactive.is_active = false;
        let mut other_table = record(5, "amount", "NULL_CHECK", json!({}), 0.0);
        other_table.table_name = "fact_transaction".into();

        let orch = orchestrator(
            vec![
                record(1, "email", "NULL_CHEK", json!({}), 0.0),
                record(2, "email", "PATTERN_CHECK", json!({}), 0.0),
                record(3, "customer_id", "UNIQUENESS_CHECK", json!({}), 0.0),
                inactive,
                other_table,
            ],
            Arc::new(MemorySink::new()),
        );

        let report = orch.evaluate(&EntityConfig::new("customer", "dim_customer"), customers()).await;

        assert!(report.is_success());
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].contains("#1"));
        assert!(report.warnings[1].contains("#2"));
        assert_eq!(report.rules_evaluated, 1);
        assert_eq!(report.metrics[0].rule_id, 3);
        assert_eq!(report.metrics[0].status, MetricStatus::Passed);
    }

    #[tokio::test]
    async fn test_evaluate_does_not_persist() {
        let sink = MemorySink::new();
        let orch = orchestrator(Vec::new(), Arc::new(sink.clone()));
        let report = orch.evaluate(&customer_entity(), customers()).await;
        assert_eq!(report.anomalies.len(), 1);
        assert!(sink.anomalies().is_empty());
    }

    #[tokio::test]
    async fn test_missing_id_column_falls_back_to_positions() {
        let mut entity = customer_entity();
        entity.id_column = Some("uuid".into());
        let orch = orchestrator(Vec::new(), Arc::new(MemorySink::new()));

        let report = orch.run(&entity, customers()).await;

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.anomalies[0].record_id.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_report_serializes_stage_names() {
        let mut report = QualityReport::new("customer", "dim_customer");
        report.failures.push(StageFailure {
            stage: Stage::PersistAnomalies,
            message: "x".into(),
        });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failures"][0]["stage"], "persist_anomalies");
        assert_eq!(json["entity"], "customer");
    }
}
