// sentinel-core/src/lib.rs

#![allow(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::perf)]

// Contracts towards rule stores, warehouses and result sinks.
pub mod ports;

// Snapshot model, quality rules, metric evaluation and anomaly detectors.
// Pure and synchronous; depends on nothing else in the crate.
pub mod domain;

// Adapters: YAML configuration, rule store, DuckDB, in-memory sinks.
pub mod infrastructure;

// Use cases: per-entity orchestration and concurrent batches.
pub mod application;

pub mod error;

pub use error::SentinelError;
