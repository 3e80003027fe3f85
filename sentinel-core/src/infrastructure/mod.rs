// sentinel-core/src/infrastructure/mod.rs

pub mod adapters;
pub mod config;
pub mod error;
pub mod rule_store;

pub use rule_store::RuleStore;
