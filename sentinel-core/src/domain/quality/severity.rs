// sentinel-core/src/domain/quality/severity.rs

use serde::{Deserialize, Serialize};
use std::fmt;

// Declaration order gives Low < Medium < High < Critical, which lets the
// alerting side compare tiers with plain operators.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Tier of an isolation-forest anomaly score (absolute value, in `(0, 1]`).
    pub fn from_isolation_score(score: f64) -> Self {
        let score = score.abs();
        if score > 0.8 {
            Self::Critical
        } else if score > 0.6 {
            Self::High
        } else if score > 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Tier of a rolling-window deviation expressed in standard deviations.
    pub fn from_deviation(deviation: f64) -> Self {
        if deviation > 5.0 {
            Self::Critical
        } else if deviation > 4.0 {
            Self::High
        } else if deviation > 3.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_isolation_score_cut_points() {
        assert_eq!(Severity::from_isolation_score(0.81), Severity::Critical);
        assert_eq!(Severity::from_isolation_score(0.8), Severity::High);
        assert_eq!(Severity::from_isolation_score(0.61), Severity::High);
        assert_eq!(Severity::from_isolation_score(0.6), Severity::Medium);
        assert_eq!(Severity::from_isolation_score(0.41), Severity::Medium);
        assert_eq!(Severity::from_isolation_score(0.4), Severity::Low);
        assert_eq!(Severity::from_isolation_score(-0.9), Severity::Critical);
    }

    #[test]
    fn test_deviation_cut_points() {
        assert_eq!(Severity::from_deviation(5.01), Severity::Critical);
        assert_eq!(Severity::from_deviation(5.0), Severity::High);
        assert_eq!(Severity::from_deviation(4.5), Severity::High);
        assert_eq!(Severity::from_deviation(3.5), Severity::Medium);
        assert_eq!(Severity::from_deviation(3.0), Severity::Low);
        assert_eq!(Severity::from_deviation(f64::INFINITY), Severity::Critical);
    }

    #[test]
    fn test_tiers_are_monotone() {
        let mut prev_score = Severity::Low;
        let mut prev_dev = Severity::Low;
        for step in 0..=1200 {
            let x = step as f64 / 100.0;
            let by_score = Severity::from_isolation_score(x / 12.0);
            let by_dev = Severity::from_deviation(x);
            assert!(by_score >= prev_score, "score tier dropped at {}", x / 12.0);
            assert!(by_dev >= prev_dev, "deviation tier dropped at {}", x);
            prev_score = by_score;
            prev_dev = by_dev;
        }
        assert_eq!(prev_dev, Severity::Critical);
        assert_eq!(prev_score, Severity::Critical);
    }

    #[test]
    fn test_display_and_parsing_consistency() {
        for sev in Severity::ALL {
            assert_eq!(Severity::from_str(&sev.to_string()).unwrap(), sev);
        }
        assert_eq!(Severity::from_str("high").unwrap(), Severity::High);
        assert!(Severity::from_str("urgent").is_err());
    }
}
