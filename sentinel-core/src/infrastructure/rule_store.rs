// sentinel-core/src/infrastructure/rule_store.rs

use async_trait::async_trait;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

use crate::domain::quality::RuleRecord;
use crate::error::SentinelError;
use crate::infrastructure::config::load_rule_records;
use crate::ports::RuleSource;

/// In-memory rule store shared by concurrent runs.
///
/// Readers get a copy of the rule list, so a run never observes an update
/// made after it started.
#[derive(Debug, Default)]
pub struct RuleStore {
    rules: RwLock<Vec<RuleRecord>>,
}

impl RuleStore {
    pub fn new(rules: Vec<RuleRecord>) -> Self {
        Self {
            rules: RwLock::new(rules),
        }
    }

    /// Loads the store from rule files. Also returns the entries that were skipped.
    pub fn from_path(path: &Path) -> Result<(Self, Vec<String>), SentinelError> {
        let loaded = load_rule_records(path)?;
        Ok((Self::new(loaded.records), loaded.rejected))
    }

    pub fn snapshot(&self) -> Result<Vec<RuleRecord>, SentinelError> {
        Ok(self.read()?.clone())
    }

    /// Swaps the whole rule set.
    pub fn replace(&self, rules: Vec<RuleRecord>) -> Result<(), SentinelError> {
        let mut guard = self.write()?;
        info!(old = guard.len(), new = rules.len(), "Rule set replaced");
        *guard = rules;
        Ok(())
    }

    /// Inserts a rule, or overwrites the one with the same `rule_id`.
    pub fn upsert(&self, rule: RuleRecord) -> Result<(), SentinelError> {
        let mut guard = self.write()?;
        match guard.iter_mut().find(|r| r.rule_id == rule.rule_id) {
            Some(existing) => *existing = rule,
            None => guard.push(rule),
        }
        Ok(())
    }

    /// Marks a rule inactive. Returns `false` if no rule has that id.
    pub fn deactivate(&self, rule_id: i64) -> Result<bool, SentinelError> {
        let mut guard = self.write()?;
        match guard.iter_mut().find(|r| r.rule_id == rule_id) {
            Some(rule) => {
                rule.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<RuleRecord>>, SentinelError> {
        self.rules
            .read()
            .map_err(|_| SentinelError::InternalError("Rule store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<RuleRecord>>, SentinelError> {
        self.rules
            .write()
            .map_err(|_| SentinelError::InternalError("Rule store lock poisoned".into()))
    }
}

#[async_trait]
impl RuleSource for RuleStore {
    async fn load_rules(&self) -> Result<Vec<RuleRecord>, SentinelError> {
        self.snapshot()
    }
}
