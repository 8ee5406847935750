//! Release lines of the mesh control plane.

use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Version {
    V2_0,
    V2_1,
    V2_2,
    V2_3,
    V2_4,
    V2_5,
    V2_6,
}

impl Version {
    pub const ALL: &'static [Version] = &[
        Version::V2_0,
        Version::V2_1,
        Version::V2_2,
        Version::V2_3,
        Version::V2_4,
        Version::V2_5,
        Version::V2_6,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::V2_0 => "v2.0",
            Version::V2_1 => "v2.1",
            Version::V2_2 => "v2.2",
            Version::V2_3 => "v2.3",
            Version::V2_4 => "v2.4",
            Version::V2_5 => "v2.5",
            Version::V2_6 => "v2.6",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown control plane version: {0}")]
pub struct UnknownVersion(pub String);

impl FromStr for Version {
    type Err = UnknownVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVersion(s.to_string()))
    }
}
