// sentinel-core/src/ports/mod.rs

// Contracts the engine needs from the outside world. Adapters live in
// `infrastructure`; the domain never sees them.

pub mod rule_source;
pub mod sink;
pub mod snapshot;

pub use rule_source::RuleSource;
pub use sink::PersistenceSink;
pub use snapshot::SnapshotProvider;
