pub mod detection;
pub mod entity;
pub mod error;
pub mod quality;
pub mod snapshot;

pub use entity::{EntityConfig, TemporalConfig};
pub use error::DomainError;
pub use snapshot::{Row, Snapshot, Value};
