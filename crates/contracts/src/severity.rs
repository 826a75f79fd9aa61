//! Severity - ordinal event importance
//!
//! Declaration order defines the total order used by routing:
//! `info < success < warning < error < critical`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ContractError;

/// Event severity.
///
/// # Examples
/// ```
/// use contracts::Severity;
///
/// assert!(Severity::Info < Severity::Critical);
/// assert_eq!("WARNING".parse::<Severity>().unwrap(), Severity::Warning);
/// assert!("fatal".parse::<Severity>().is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// All severities, lowest first
    pub const ALL: [Severity; 5] = [
        Severity::Info,
        Severity::Success,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
    ];

    /// Lower-case tag as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }

    /// Critical events bypass alert sampling and do-not-disturb
    pub fn is_critical(&self) -> bool {
        matches!(self, Severity::Critical)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "success" => Ok(Severity::Success),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" => Ok(Severity::Critical),
            _ => Err(ContractError::UnknownSeverity { tag: s.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order() {
        for pair in Severity::ALL.windows(2) {
            assert!(pair[0] < pair[1], "{} should be < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_parse_unknown_tag() {
        let err = "panic".parse::<Severity>().unwrap_err();
        assert!(matches!(err, ContractError::UnknownSeverity { ref tag } if tag == "panic"));
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
        let parsed: Severity = serde_json::from_str("\"success\"").unwrap();
        assert_eq!(parsed, Severity::Success);
    }
}
