//! Link schema versioning utilities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LinkError;

/// API group every th2 resource version tag is prefixed with
pub const API_GROUP: &str = "th2.exactpro.com";

/// Schema version a link document declares in its `apiVersion`
///
/// The set is closed: supporting a new version means adding a variant here
/// and a matching shape in [`crate::link`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkSchemaVersion {
    /// `th2.exactpro.com/v1`, kebab-case relation names
    V1,
    /// `th2.exactpro.com/v2`, camelCase relation names
    V2,
}

impl LinkSchemaVersion {
    /// The newest version, the shape box specs are expected to be in
    pub const LATEST: Self = Self::V2;

    /// Get the short version name (e.g., "v1")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }

    /// Get the full `apiVersion` tag (e.g., "th2.exactpro.com/v1")
    pub fn api_version(&self) -> String {
        format!("{}/{}", API_GROUP, self.as_str())
    }

    /// Check whether this is the latest version
    pub fn is_latest(&self) -> bool {
        *self == Self::LATEST
    }
}

impl FromStr for LinkSchemaVersion {
    type Err = LinkError;

    /// Parse an `apiVersion` tag, with or without the API group prefix
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let trimmed = tag.trim();
        let short = trimmed
            .strip_prefix(API_GROUP)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(trimmed);

        match short {
            "v1" => Ok(Self::V1),
            "v2" => Ok(Self::V2),
            _ => Err(LinkError::UnsupportedVersion(tag.to_string())),
        }
    }
}

impl fmt::Display for LinkSchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.api_version())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_tag() {
        assert_eq!("th2.exactpro.com/v1".parse::<LinkSchemaVersion>().unwrap(), LinkSchemaVersion::V1);
        assert_eq!("th2.exactpro.com/v2".parse::<LinkSchemaVersion>().unwrap(), LinkSchemaVersion::V2);
    }

    #[test]
    fn test_parse_short_tag() {
        assert_eq!("v1".parse::<LinkSchemaVersion>().unwrap(), LinkSchemaVersion::V1);
        assert_eq!(" v2 ".parse::<LinkSchemaVersion>().unwrap(), LinkSchemaVersion::V2);
    }

    #[test]
    fn test_parse_unknown_tag() {
        let err = "th2.exactpro.com/v3".parse::<LinkSchemaVersion>().unwrap_err();
        assert!(err.to_string().contains("th2.exactpro.com/v3"));
        assert!("other.group/v1".parse::<LinkSchemaVersion>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for version in [LinkSchemaVersion::V1, LinkSchemaVersion::V2] {
            assert_eq!(version.to_string().parse::<LinkSchemaVersion>().unwrap(), version);
        }
        assert!(LinkSchemaVersion::V2.is_latest());
        assert!(!LinkSchemaVersion::V1.is_latest());
    }
}
