// sentinel-core/src/domain/snapshot.rs

use crate::domain::error::DomainError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// A typed scalar cell of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Timestamp(NaiveDateTime),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell. Booleans count as 0/1, text is never parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Text coercion used by pattern checks. Null becomes the empty string.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Hashable identity for distinct counting. `None` for nulls.
    pub fn distinct_key(&self) -> Option<DistinctKey> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(DistinctKey::Bool(*b)),
            // -0.0 and 0.0 are the same value
            Value::Number(n) => Some(DistinctKey::Number(if *n == 0.0 {
                0.0f64.to_bits()
            } else {
                n.to_bits()
            })),
            Value::Timestamp(ts) => Some(DistinctKey::Timestamp(*ts)),
            Value::Text(s) => Some(DistinctKey::Text(s.clone())),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Number(_) => 1,
            Value::Timestamp(_) => 2,
            Value::Text(_) => 3,
            Value::Null => 4,
        }
    }

    /// Total order used to sort rows by a column: nulls last, mixed types grouped.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DistinctKey {
    Bool(bool),
    Number(u64),
    Timestamp(NaiveDateTime),
    Text(String),
}

/// One row, positionally aligned with the snapshot's column list.
pub type Row = Vec<Value>;

/// In-memory, read-only tabular view of a table at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    columns: Vec<String>,
    rows: Vec<Row>,
    index: HashMap<String, usize>,
    id_column: Option<usize>,
}

impl Snapshot {
    /// Builds a snapshot; every row must have exactly one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self, DomainError> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            return Err(DomainError::SnapshotShape(format!(
                "row {} has {} cells, expected {}",
                i,
                row.len(),
                columns.len()
            )));
        }
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Ok(Self {
            columns,
            rows,
            index,
            id_column: None,
        })
    }

    /// Convenience for single-column snapshots (tests, ad-hoc checks).
    pub fn from_column(name: &str, values: Vec<Value>) -> Self {
        let rows = values.into_iter().map(|v| vec![v]).collect();
        Self {
            columns: vec![name.to_string()],
            rows,
            index: HashMap::from([(name.to_string(), 0)]),
            id_column: None,
        }
    }

    /// Use the given column's values as record identifiers. Ignored if absent.
    pub fn with_id_column(mut self, column: &str) -> Self {
        self.id_column = self.index.get(column).copied();
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Iterates the cells of one column, or `None` if the column does not exist.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Stable identifier of a row: its id column value, or its position.
    pub fn record_id(&self, row: usize) -> String {
        match self.id_column.and_then(|c| self.rows.get(row).map(|r| &r[c])) {
            Some(v) if !v.is_null() => v.to_text(),
            _ => row.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> Value {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .into()
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let res = Snapshot::new(
            vec!["a".into(), "b".into()],
            vec![vec![Value::from(1.0), Value::Null], vec![Value::from(2.0)]],
        );
        assert!(res.unwrap_err().to_string().contains("row 1"));
    }

    #[test]
    fn test_column_access_and_row_count() {
        let snap = Snapshot::new(
            vec!["id".into(), "email".into()],
            vec![
                vec![Value::from(7i64), "a@x.com".into()],
                vec![Value::from(8i64), Value::Null],
            ],
        )
        .unwrap();

        assert_eq!(snap.row_count(), 2);
        assert!(snap.has_column("email"));
        assert!(snap.column("missing").is_none());
        let nulls = snap.column("email").unwrap().filter(|v| v.is_null()).count();
        assert_eq!(nulls, 1);
    }

    #[test]
    fn test_record_id_uses_id_column_when_present() {
        let snap = Snapshot::new(
            vec!["customer_id".into()],
            vec![vec!["C-1".into()], vec![Value::Null]],
        )
        .unwrap()
        .with_id_column("customer_id");

        assert_eq!(snap.record_id(0), "C-1");
        // null identifiers fall back to position
        assert_eq!(snap.record_id(1), "1");
    }

    #[test]
    fn test_sort_cmp_puts_nulls_last() {
        let mut values = vec![Value::Null, ts(3), ts(1)];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(values, vec![ts(1), ts(3), Value::Null]);
    }

    #[test]
    fn test_distinct_key_normalizes_negative_zero() {
        assert_eq!(
            Value::from(0.0).distinct_key(),
            Value::from(-0.0).distinct_key()
        );
        assert_eq!(Value::Null.distinct_key(), None);
    }

    #[test]
    fn test_text_coercion() {
        assert_eq!(Value::Null.to_text(), "");
        assert_eq!(Value::from(10.0).to_text(), "10");
        assert_eq!(Value::from(2.5).to_text(), "2.5");
        assert_eq!(ts(2).to_text(), "2024-01-02 00:00:00");
    }
}
