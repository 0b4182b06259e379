//! Desired package states

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target state requested for a package.
///
/// Parsed once at the input boundary; everything downstream matches on the
/// variant instead of comparing strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ensure {
    /// `present` or `installed`: any version is acceptable
    Present,
    /// `absent` or `purged`
    Absent,
    /// `held`: not supported
    Held,
    /// `latest`: newest available build
    Latest,
    /// Any other value is a version token
    Version(String),
}

impl Ensure {
    /// Check if this value can be planned.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Held)
    }
}

impl FromStr for Ensure {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" | "installed" => Ok(Self::Present),
            "absent" | "purged" => Ok(Self::Absent),
            "held" => Ok(Self::Held),
            "latest" => Ok(Self::Latest),
            v if v.trim().is_empty() => Err(Error::InvalidEnsure(v.to_string())),
            v => Ok(Self::Version(v.to_string())),
        }
    }
}

impl TryFrom<String> for Ensure {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ensure> for String {
    fn from(ensure: Ensure) -> Self {
        ensure.to_string()
    }
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => write!(f, "present"),
            Self::Absent => write!(f, "absent"),
            Self::Held => write!(f, "held"),
            Self::Latest => write!(f, "latest"),
            Self::Version(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbolic_states() {
        assert_eq!("present".parse::<Ensure>().unwrap(), Ensure::Present);
        assert_eq!("installed".parse::<Ensure>().unwrap(), Ensure::Present);
        assert_eq!("absent".parse::<Ensure>().unwrap(), Ensure::Absent);
        assert_eq!("purged".parse::<Ensure>().unwrap(), Ensure::Absent);
        assert_eq!("held".parse::<Ensure>().unwrap(), Ensure::Held);
        assert_eq!("latest".parse::<Ensure>().unwrap(), Ensure::Latest);
    }

    #[test]
    fn test_other_values_are_versions() {
        assert_eq!(
            "2.0".parse::<Ensure>().unwrap(),
            Ensure::Version("2.0".to_string())
        );
        // Case matters: only the exact keywords are symbolic
        assert_eq!(
            "Latest".parse::<Ensure>().unwrap(),
            Ensure::Version("Latest".to_string())
        );
    }

    #[test]
    fn test_empty_value_rejected() {
        assert!(matches!(
            "".parse::<Ensure>(),
            Err(Error::InvalidEnsure(_))
        ));
    }

    #[test]
    fn test_string_conversions() {
        assert_eq!(Ensure::try_from("latest".to_string()).unwrap(), Ensure::Latest);
        assert_eq!(String::from(Ensure::Version("1.2-3".into())), "1.2-3");
        assert_eq!(String::from(Ensure::Present), "present");
    }
}
