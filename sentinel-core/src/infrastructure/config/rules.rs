// sentinel-core/src/infrastructure/config/rules.rs

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::domain::quality::RuleRecord;
use crate::infrastructure::error::InfrastructureError;

const RULE_EXTENSIONS: [&str; 2] = ["yml", "yaml"];

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<serde_yaml::Value>,
}

/// Rule records read from disk, plus the entries that could not be read.
#[derive(Debug, Default)]
pub struct LoadedRules {
    pub records: Vec<RuleRecord>,
    /// One message per skipped entry, naming its file and position.
    pub rejected: Vec<String>,
}

/// Loads rule records from a YAML file or from every YAML file under a directory.
///
/// Files are read in path order. An entry that does not deserialize into a
/// [`RuleRecord`] is skipped with a warning; the other entries still load.
/// Records without a `rule_id` key get the next free id after the highest
/// explicit one. A missing path yields no rules.
#[instrument]
pub fn load_rule_records(path: &Path) -> Result<LoadedRules, InfrastructureError> {
    let mut loaded = LoadedRules::default();
    if !path.exists() {
        warn!(path = ?path, "Rules path does not exist, no rules loaded");
        return Ok(loaded);
    }

    let mut entries: Vec<(RuleRecord, bool)> = Vec::new();
    for file in rule_files(path) {
        let content = fs::read_to_string(&file)?;
        let parsed: RuleFile = serde_yaml::from_str(&content).map_err(|e| {
            InfrastructureError::ConfigError(format!("Invalid rule file {:?}: {}", file, e))
        })?;
        debug!(file = ?file, count = parsed.rules.len(), "Rule file parsed");

        for (index, entry) in parsed.rules.into_iter().enumerate() {
            let explicit_id = entry.get("rule_id").is_some();
            match serde_yaml::from_value::<RuleRecord>(entry) {
                Ok(record) => entries.push((record, explicit_id)),
                Err(e) => {
                    warn!(file = ?file, index, error = %e, "Malformed rule skipped");
                    loaded
                        .rejected
                        .push(format!("{}: rules[{}]: {}", file.display(), index, e));
                }
            }
        }
    }

    assign_missing_ids(&mut entries);
    loaded.records = entries.into_iter().map(|(record, _)| record).collect();
    info!(
        count = loaded.records.len(),
        rejected = loaded.rejected.len(),
        "Rule records loaded"
    );
    Ok(loaded)
}

fn rule_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| {
            p.is_file()
                && p
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| RULE_EXTENSIONS.contains(&ext))
        })
        .collect();
    files.sort();
    files
}

fn assign_missing_ids(entries: &mut [(RuleRecord, bool)]) {
    let mut next = entries
        .iter()
        .filter(|(_, explicit)| *explicit)
        .map(|(r, _)| r.rule_id)
        .max()
        .unwrap_or(0)
        .max(0)
        + 1;
    for (record, _) in entries.iter_mut().filter(|(_, explicit)| !*explicit) {
        record.rule_id = next;
        next += 1;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    const CUSTOMER_RULES: &str = r#"
rules:
  - rule_id: 10
    table_name: dim_customer
    column_name: email
    rule_type: PATTERN_CHECK
    rule_definition:
      pattern: '[^@]+@[^@]+\.[a-z]+'
    threshold: 0.0
    severity: HIGH
  - table_name: dim_customer
    column_name: customer_id
    rule_type: UNIQUENESS_CHECK
    threshold: 0.0
    severity: CRITICAL
"#;

    const TRANSACTION_RULES: &str = r#"
rules:
  - table_name: fact_transaction
    column_name: amount
    rule_type: RANGE_CHECK
    rule_definition: {min: 0, max: 1000000}
    threshold: 0.001
    severity: HIGH
    is_active: false
"#;

    #[test]
    fn test_loads_directory_in_path_order() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir(dir.path().join("nested"))?;
        fs::write(dir.path().join("a_customer.yml"), CUSTOMER_RULES)?;
        fs::write(dir.path().join("nested/transaction.yaml"), TRANSACTION_RULES)?;
        fs::write(dir.path().join("README.md"), "not a rule file")?;

        let records = load_rule_records(dir.path())?.records;
        let ids: Vec<i64> = records.iter().map(|r| r.rule_id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
        assert_eq!(records[2].table_name, "fact_transaction");
        assert!(!records[2].is_active);
        Ok(())
    }

    #[test]
    fn test_single_file() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("rules.yml");
        fs::write(&file, TRANSACTION_RULES)?;
        let records = load_rule_records(&file)?.records;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rule_id, 1);
        Ok(())
    }

    #[test]
    fn test_missing_path_is_empty() {
        let dir = tempdir().unwrap();
        let loaded = load_rule_records(&dir.path().join("rules")).unwrap();
        assert!(loaded.records.is_empty());
        assert!(loaded.rejected.is_empty());
    }

    #[test]
    fn test_malformed_file_names_the_file() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("broken.yml"), "rules:\n  - table_name: [\n")?;
        let err = load_rule_records(dir.path()).unwrap_err();
        assert!(err.to_string().contains("broken.yml"));
        Ok(())
    }

    #[test]
    fn test_malformed_entry_is_skipped_and_reported() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("customer.yml");
        fs::write(
            &file,
            r#"
rules:
  - rule_id: 1
    table_name: dim_customer
    column_name: email
    rule_type: NULL_CHECK
    threshold: 0.0
    severity: HIGH
  - rule_id: 2
    table_name: dim_customer
    column_name: phone
    rule_type: NULL_CHECK
    threshold: 0.0
  - rule_id: 3
    table_name: dim_customer
    column_name: balance
    rule_type: RANGE_CHECK
    threshold: low
    severity: HIGH
"#,
        )?;

        let loaded = load_rule_records(&file)?;
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].column_name, "email");
        assert_eq!(loaded.rejected.len(), 2);
        assert!(loaded.rejected[0].contains("rules[1]"));
        assert!(loaded.rejected[0].contains("severity"));
        assert!(loaded.rejected[1].contains("rules[2]"));
        Ok(())
    }

    #[test]
    fn test_explicit_zero_id_is_kept() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("rules.yml");
        fs::write(
            &file,
            r#"
rules:
  - rule_id: 0
    table_name: t
    column_name: a
    rule_type: NULL_CHECK
    threshold: 0.0
    severity: LOW
  - table_name: t
    column_name: b
    rule_type: NULL_CHECK
    threshold: 0.0
    severity: LOW
"#,
        )?;

        let ids: Vec<i64> = load_rule_records(&file)?
            .records
            .iter()
            .map(|r| r.rule_id)
            .collect();
        assert_eq!(ids, vec![0, 1]);
        Ok(())
    }
}
