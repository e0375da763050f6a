//! Release versions and the since/deprecated lifecycle of a symbol.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static RE_VERSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)*$").unwrap());

/// A dotted release number such as `0.55.0`.
///
/// Components compare numerically, so `0.9` sorts before `0.10`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version(Vec<u32>);

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !RE_VERSION.is_match(s) {
            return Err(format!("invalid version `{}`", s));
        }
        s.split('.')
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| format!("version component out of range in `{}`", s))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Version)
    }
}

impl TryFrom<String> for Version {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|p| p.to_string()).collect();
        f.write_str(&parts.join("."))
    }
}

/// When a symbol appeared and, optionally, when it was deprecated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub since: Option<Version>,
    pub deprecated: Option<Version>,
}

impl Lifecycle {
    pub fn new(since: Option<Version>, deprecated: Option<Version>) -> Self {
        Self { since, deprecated }
    }

    /// Combine a member's own lifecycle with the lifecycle of its owner.
    ///
    /// A member cannot exist before its owner, so the later `since` wins.
    /// A member is deprecated as soon as either it or its owner is, so the
    /// earlier `deprecated` wins.
    pub fn within(&self, owner: &Lifecycle) -> Lifecycle {
        let since = self.since.clone().max(owner.since.clone());
        let deprecated = match (&self.deprecated, &owner.deprecated) {
            (Some(own), Some(outer)) => Some(own.clone().min(outer.clone())),
            (Some(v), None) | (None, Some(v)) => Some(v.clone()),
            (None, None) => None,
        };
        Lifecycle { since, deprecated }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(v("0.55.0").to_string(), "0.55.0");
        assert_eq!(v(" 1.0 ").to_string(), "1.0");
    }

    #[test]
    fn rejects_garbage() {
        assert!("1.x".parse::<Version>().is_err());
        assert!("".parse::<Version>().is_err());
        assert!("v1.0".parse::<Version>().is_err());
        assert!("1..0".parse::<Version>().is_err());
    }

    #[test]
    fn numeric_ordering() {
        assert!(v("0.9") < v("0.10"));
        assert!(v("1.2.3") < v("1.10.0"));
    }

    #[test]
    fn member_lifecycle_takes_later_since() {
        let owner = Lifecycle::new(Some(v("0.50.0")), None);
        let member = Lifecycle::new(Some(v("0.40.0")), None);
        assert_eq!(member.within(&owner).since, Some(v("0.50.0")));

        let member = Lifecycle::new(None, None);
        assert_eq!(member.within(&owner).since, Some(v("0.50.0")));

        let member = Lifecycle::new(Some(v("0.60.0")), None);
        assert_eq!(member.within(&owner).since, Some(v("0.60.0")));
    }

    #[test]
    fn member_lifecycle_takes_earlier_deprecation() {
        let owner = Lifecycle::new(None, Some(v("1.2")));
        let member = Lifecycle::new(None, Some(v("1.4")));
        assert_eq!(member.within(&owner).deprecated, Some(v("1.2")));

        let member = Lifecycle::new(None, None);
        assert_eq!(member.within(&owner).deprecated, Some(v("1.2")));

        let undeprecated_owner = Lifecycle::default();
        assert_eq!(
            Lifecycle::new(None, Some(v("1.4")))
                .within(&undeprecated_owner)
                .deprecated,
            Some(v("1.4"))
        );
    }
}
