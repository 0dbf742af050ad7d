//! Risk level domain model.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Security risk classification of a listener.
///
/// Levels are totally ordered by [`RiskLevel::ordinal`]:
/// `Critical > High > Medium > Low > Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
    /// No baseline knowledge and no contextual factor raised it.
    #[default]
    Unknown,
}

impl RiskLevel {
    /// All levels, most severe first.
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Critical,
        RiskLevel::High,
        RiskLevel::Medium,
        RiskLevel::Low,
        RiskLevel::Unknown,
    ];

    /// Numeric rank used for sorting and escalation comparisons.
    pub fn ordinal(self) -> u8 {
        match self {
            RiskLevel::Critical => 4,
            RiskLevel::High => 3,
            RiskLevel::Medium => 2,
            RiskLevel::Low => 1,
            RiskLevel::Unknown => 0,
        }
    }

    /// Whether alerts for this level must never be silenced.
    pub fn is_elevated(self) -> bool {
        matches!(self, RiskLevel::Critical | RiskLevel::High)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "Critical",
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
            RiskLevel::Unknown => "Unknown",
        }
    }
}

impl PartialOrd for RiskLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RiskLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordinal().cmp(&other.ordinal())
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RiskLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown risk level '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_is_strict_total_order() {
        let ordinals: Vec<u8> = RiskLevel::ALL.iter().map(|l| l.ordinal()).collect();
        assert_eq!(ordinals, vec![4, 3, 2, 1, 0]);

        for a in RiskLevel::ALL {
            for b in RiskLevel::ALL {
                assert_eq!(a == b, a.ordinal() == b.ordinal());
                assert_eq!(a.cmp(&b), a.ordinal().cmp(&b.ordinal()));
            }
        }
        assert!(RiskLevel::Critical > RiskLevel::High);
        assert!(RiskLevel::Low > RiskLevel::Unknown);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("critical".parse::<RiskLevel>(), Ok(RiskLevel::Critical));
        assert_eq!(" HIGH ".parse::<RiskLevel>(), Ok(RiskLevel::High));
        assert!("severe".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn test_serde_uses_variant_names() {
        let json = serde_json::to_string(&RiskLevel::Medium).unwrap();
        assert_eq!(json, "\"Medium\"");
    }
}
