//! Operator classification: kind flags and priority levels.

use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use crate::error::ConfigError;

/// Bitmask classifying an operator for filtering and prioritization.
///
/// The core only combines kinds with `|`; their meaning belongs to the
/// scheduler that reads them back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct OperatorKind(u32);

/// Flag names in bit order.
const KIND_NAMES: &[(OperatorKind, &str)] = &[
    (OperatorKind::LEADER, "leader"),
    (OperatorKind::REGION, "region"),
    (OperatorKind::ADMIN, "admin"),
    (OperatorKind::HOT_REGION, "hot-region"),
    (OperatorKind::ADJACENT, "adjacent"),
    (OperatorKind::REPLICA, "replica"),
    (OperatorKind::BALANCE, "balance"),
];

impl OperatorKind {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Moves leadership.
    pub const LEADER: Self = Self(1 << 0);
    /// Moves replicas.
    pub const REGION: Self = Self(1 << 1);
    /// Requested by an administrator.
    pub const ADMIN: Self = Self(1 << 2);
    /// Issued for a hot partition.
    pub const HOT_REGION: Self = Self(1 << 3);
    /// Issued for adjacent partitions.
    pub const ADJACENT: Self = Self(1 << 4);
    /// Repairs the replica count.
    pub const REPLICA: Self = Self(1 << 5);
    /// Balances load across stores.
    pub const BALANCE: Self = Self(1 << 6);

    /// Returns the raw bitmask.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if every flag of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if no flag is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the names of the set flags, in bit order.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        KIND_NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for OperatorKind {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for OperatorKind {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl FromStr for OperatorKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        KIND_NAMES
            .iter()
            .find(|(_, name)| *name == wanted)
            .map(|(flag, _)| *flag)
            .ok_or(ConfigError::UnknownKind { name: wanted })
    }
}

impl TryFrom<Vec<String>> for OperatorKind {
    type Error = ConfigError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        names
            .iter()
            .try_fold(Self::NONE, |acc, name| Ok(acc | name.parse::<Self>()?))
    }
}

impl From<OperatorKind> for Vec<String> {
    fn from(kind: OperatorKind) -> Self {
        kind.names().into_iter().map(String::from).collect()
    }
}

impl std::fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.names().join(","))
    }
}

/// Priority level of an operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    /// Background work.
    Low,
    /// Regular scheduling.
    #[default]
    Normal,
    /// Urgent repair.
    High,
}

impl std::fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_combination() {
        let kind = OperatorKind::BALANCE | OperatorKind::REGION | OperatorKind::LEADER;
        assert!(kind.contains(OperatorKind::REGION));
        assert!(kind.contains(OperatorKind::LEADER | OperatorKind::BALANCE));
        assert!(!kind.contains(OperatorKind::ADMIN));
        assert_eq!(kind.to_string(), "leader,region,balance");
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("hot-region".parse::<OperatorKind>().unwrap(), OperatorKind::HOT_REGION);
        assert_eq!(" Admin ".parse::<OperatorKind>().unwrap(), OperatorKind::ADMIN);
        assert!("bogus".parse::<OperatorKind>().is_err());
    }

    #[test]
    fn test_kind_serde_as_names() {
        let kind: OperatorKind = serde_yaml::from_str("[admin, replica]").unwrap();
        assert_eq!(kind, OperatorKind::ADMIN | OperatorKind::REPLICA);
        assert_eq!(serde_json::to_string(&kind).unwrap(), r#"["admin","replica"]"#);
        assert!(OperatorKind::NONE.is_empty());
    }

    #[test]
    fn test_priority_default() {
        assert_eq!(PriorityLevel::default(), PriorityLevel::Normal);
        assert!(PriorityLevel::High > PriorityLevel::Low);
    }
}
