pub mod duckdb;
pub mod memory;

pub use self::duckdb::{ANOMALIES_TABLE, DuckDbWarehouse, METRICS_TABLE};
pub use memory::MemorySink;
