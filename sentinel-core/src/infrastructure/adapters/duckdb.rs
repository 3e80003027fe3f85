// sentinel-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use duckdb::{Config, Connection, params};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument};

use crate::domain::quality::{Anomaly, Metric};
use crate::domain::snapshot::{Row, Snapshot, Value};
use crate::error::SentinelError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::{PersistenceSink, SnapshotProvider};

pub const METRICS_TABLE: &str = "quality_metrics";
pub const ANOMALIES_TABLE: &str = "data_anomalies";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// How a warehouse column is read into a snapshot [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Number,
    Boolean,
    Timestamp,
    Text,
}

impl ColumnKind {
    fn from_sql_type(data_type: &str) -> Self {
        let t = data_type.trim().to_uppercase();
        if t.starts_with("TIMESTAMP") || t == "DATE" || t == "DATETIME" {
            Self::Timestamp
        } else if t == "BOOLEAN" || t == "BOOL" {
            Self::Boolean
        } else if t.starts_with("DECIMAL")
            || t.starts_with("NUMERIC")
            || matches!(
                t.as_str(),
                "TINYINT"
                    | "SMALLINT"
                    | "INTEGER"
                    | "BIGINT"
                    | "HUGEINT"
                    | "UTINYINT"
                    | "USMALLINT"
                    | "UINTEGER"
                    | "UBIGINT"
                    | "FLOAT"
                    | "REAL"
                    | "DOUBLE"
            )
        {
            Self::Number
        } else {
            Self::Text
        }
    }

    fn select_expr(&self, column: &str) -> String {
        let col = quote_ident(column);
        match self {
            Self::Number => format!("CAST({} AS DOUBLE)", col),
            Self::Boolean => col,
            Self::Timestamp => format!("epoch_us(CAST({} AS TIMESTAMP))", col),
            Self::Text => format!("CAST({} AS VARCHAR)", col),
        }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// DuckDB-backed warehouse: reads table snapshots and stores quality results.
pub struct DuckDbWarehouse {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDbWarehouse {
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();
        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, InfrastructureError> {
        self.conn
            .lock()
            .map_err(|_| InfrastructureError::Database(DatabaseError::Poisoned))
    }

    pub fn execute(&self, sql: &str) -> Result<(), InfrastructureError> {
        self.lock()?.execute_batch(sql)?;
        Ok(())
    }

    /// Exposes a CSV file as a view named `name`.
    pub fn register_csv(&self, name: &str, path: &str) -> Result<(), InfrastructureError> {
        debug!(name, path, "Registering CSV source");
        self.execute(&format!(
            "CREATE OR REPLACE VIEW {} AS SELECT * FROM read_csv_auto({})",
            quote_ident(name),
            quote_literal(path)
        ))
    }

    /// Creates the result tables if they do not exist yet.
    pub fn ensure_result_tables(&self) -> Result<(), InfrastructureError> {
        self.execute(&format!(
            "CREATE TABLE IF NOT EXISTS {METRICS_TABLE} (
                rule_id BIGINT,
                table_name VARCHAR NOT NULL,
                column_name VARCHAR NOT NULL,
                metric_type VARCHAR NOT NULL,
                metric_value DOUBLE NOT NULL,
                threshold_value DOUBLE NOT NULL,
                status VARCHAR NOT NULL,
                measured_at TIMESTAMP NOT NULL
            );
            CREATE TABLE IF NOT EXISTS {ANOMALIES_TABLE} (
                table_name VARCHAR NOT NULL,
                column_name VARCHAR,
                record_id VARCHAR,
                anomaly_type VARCHAR NOT NULL,
                description VARCHAR NOT NULL,
                severity VARCHAR NOT NULL,
                detected_at TIMESTAMP NOT NULL
            );"
        ))
    }

    /// Column names and declared SQL types, in table order.
    pub fn table_columns(&self, table_name: &str) -> Result<Vec<(String, String)>, InfrastructureError> {
        let conn = self.lock()?;
        Self::columns_of(&conn, table_name)
    }

    fn columns_of(conn: &Connection, table_name: &str) -> Result<Vec<(String, String)>, InfrastructureError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_literal(table_name)))?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>("name")?, row.get::<_, String>("type")?)))?;
        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }
        Ok(columns)
    }

    pub fn count_rows(&self, table_name: &str) -> Result<u64, InfrastructureError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table_name)),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    /// Reads a table into a snapshot, optionally only its first `limit` rows.
    #[instrument(skip(self))]
    pub fn read_table(&self, table_name: &str, limit: Option<usize>) -> Result<Snapshot, InfrastructureError> {
        let conn = self.lock()?;
        let columns = Self::columns_of(&conn, table_name)?;
        if columns.is_empty() {
            return Err(InfrastructureError::ConfigError(format!(
                "Table '{}' not found or has no columns",
                table_name
            )));
        }

        let kinds: Vec<ColumnKind> = columns.iter().map(|(_, t)| ColumnKind::from_sql_type(t)).collect();
        let select = columns
            .iter()
            .zip(&kinds)
            .map(|((name, _), kind)| kind.select_expr(name))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("SELECT {} FROM {}", select, quote_ident(table_name));
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut out: Vec<Row> = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(kinds.len());
            for (i, kind) in kinds.iter().enumerate() {
                let cell = match kind {
                    ColumnKind::Number => Value::from(row.get::<_, Option<f64>>(i)?),
                    ColumnKind::Boolean => row.get::<_, Option<bool>>(i)?.map_or(Value::Null, Value::Bool),
                    ColumnKind::Timestamp => Value::from(row.get::<_, Option<i64>>(i)?.and_then(micros_to_datetime)),
                    ColumnKind::Text => Value::from(row.get::<_, Option<String>>(i)?),
                };
                cells.push(cell);
            }
            out.push(cells);
        }

        let names = columns.into_iter().map(|(name, _)| name).collect();
        let snapshot = Snapshot::new(names, out)
            .map_err(|e| InfrastructureError::ConfigError(e.to_string()))?;
        debug!(rows = snapshot.row_count(), "Snapshot read");
        Ok(snapshot)
    }

    fn insert_metrics(&self, metrics: &[Metric]) -> Result<(), InfrastructureError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {METRICS_TABLE} VALUES (?, ?, ?, ?, ?, ?, ?, CAST(? AS TIMESTAMP))"
            ))?;
            for m in metrics {
                stmt.execute(params![
                    m.rule_id,
                    m.table_name,
                    m.column_name,
                    m.metric_type.as_str(),
                    m.metric_value,
                    m.threshold_value,
                    m.status.as_str(),
                    m.measured_at.naive_utc().format(TIMESTAMP_FORMAT).to_string(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn insert_anomalies(&self, anomalies: &[Anomaly]) -> Result<(), InfrastructureError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {ANOMALIES_TABLE} VALUES (?, ?, ?, ?, ?, ?, CAST(? AS TIMESTAMP))"
            ))?;
            for a in anomalies {
                stmt.execute(params![
                    a.table_name,
                    a.column_name,
                    a.record_id,
                    a.anomaly_type.as_str(),
                    a.description,
                    a.severity.as_str(),
                    a.detected_at.naive_utc().format(TIMESTAMP_FORMAT).to_string(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn micros_to_datetime(us: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_micros(us).map(|dt| dt.naive_utc())
}

#[async_trait]
impl SnapshotProvider for DuckDbWarehouse {
    async fn fetch_snapshot(&self, table_name: &str) -> Result<Snapshot, SentinelError> {
        Ok(self.read_table(table_name, None)?)
    }
}

#[async_trait]
impl PersistenceSink for DuckDbWarehouse {
    async fn save_metrics(&self, metrics: &[Metric]) -> Result<(), SentinelError> {
        self.insert_metrics(metrics)
            .map_err(|e| SentinelError::Persistence {
                batch: "metrics",
                reason: e.to_string(),
            })?;
        info!(count = metrics.len(), table = METRICS_TABLE, "Metrics persisted");
        Ok(())
    }

    async fn save_anomalies(&self, anomalies: &[Anomaly]) -> Result<(), SentinelError> {
        self.insert_anomalies(anomalies)
            .map_err(|e| SentinelError::Persistence {
                batch: "anomalies",
                reason: e.to_string(),
            })?;
        info!(count = anomalies.len(), table = ANOMALIES_TABLE, "Anomalies persisted");
        Ok(())
    }
}
