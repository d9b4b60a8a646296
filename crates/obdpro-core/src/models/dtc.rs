//! Diagnostic trouble code models

use serde::{Deserialize, Serialize};

/// A diagnostic trouble code as shown in the DTC monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dtc {
    /// Code string (e.g. "P0101")
    pub code: String,
    pub description: String,
    pub status: DtcStatus,
    pub severity: DtcSeverity,
}

/// Lifecycle status of a DTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DtcStatus {
    Active,
    Pending,
    Stored,
}

/// Severity of a DTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DtcSeverity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for DtcStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DtcStatus::Active => "Active",
            DtcStatus::Pending => "Pending",
            DtcStatus::Stored => "Stored",
        };
        f.write_str(s)
    }
}

impl std::fmt::Display for DtcSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DtcSeverity::Low => "Low",
            DtcSeverity::Medium => "Medium",
            DtcSeverity::High => "High",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for DtcStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(DtcStatus::Active),
            "pending" => Ok(DtcStatus::Pending),
            "stored" => Ok(DtcStatus::Stored),
            _ => Err(format!("Unknown DTC status: '{}'", s)),
        }
    }
}

impl std::str::FromStr for DtcSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(DtcSeverity::Low),
            "medium" => Ok(DtcSeverity::Medium),
            "high" => Ok(DtcSeverity::High),
            _ => Err(format!("Unknown DTC severity: '{}'", s)),
        }
    }
}

/// A filter predicate that is either "All" or one concrete value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Filter<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Filter<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(expected) => expected == value,
        }
    }
}

impl<T: std::str::FromStr<Err = String>> std::str::FromStr for Filter<T> {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(Filter::All)
        } else {
            s.parse().map(Filter::Only)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matches() {
        assert!(Filter::All.matches(&DtcStatus::Stored));
        assert!(Filter::Only(DtcStatus::Active).matches(&DtcStatus::Active));
        assert!(!Filter::Only(DtcStatus::Active).matches(&DtcStatus::Pending));
    }

    #[test]
    fn test_filter_parse() {
        let all: Filter<DtcSeverity> = "All".parse().unwrap();
        assert_eq!(all, Filter::All);
        let high: Filter<DtcSeverity> = "high".parse().unwrap();
        assert_eq!(high, Filter::Only(DtcSeverity::High));
        assert!("severe".parse::<Filter<DtcSeverity>>().is_err());
    }
}
