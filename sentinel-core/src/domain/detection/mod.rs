// sentinel-core/src/domain/detection/mod.rs

//! Row-level anomaly detection strategies.
//!
//! The three strategies are independent: each takes the snapshot plus its
//! own settings and returns the anomalies it flagged, or a
//! [`DomainError::Computation`](crate::domain::error::DomainError) that only
//! concerns that strategy.

pub mod isolation_forest;
pub mod pattern;
pub mod statistical;
pub mod temporal;

pub use isolation_forest::{ForestParams, IsolationForest};

pub const DEFAULT_CONTAMINATION: f64 = 0.1;
pub const DEFAULT_WINDOW_SIZE: usize = 24;

/// Entry point for the detection strategies.
pub struct AnomalyDetector;
