// sentinel-core/src/ports/rule_source.rs

use crate::domain::quality::RuleRecord;
use crate::error::SentinelError;
use async_trait::async_trait;

#[async_trait]
pub trait RuleSource: Send + Sync {
    /// Current rule records, active or not. Callers filter and convert.
    async fn load_rules(&self) -> Result<Vec<RuleRecord>, SentinelError>;
}
