pub mod project;
pub mod rules;

pub use project::{ProjectConfig, SourceConfig, load_project_config};
pub use rules::{LoadedRules, load_rule_records};
