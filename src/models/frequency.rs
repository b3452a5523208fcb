use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How often a medicine is taken.
///
/// Labels are matched case-insensitively. A label outside the known table is
/// kept verbatim as `Other` so it survives a storage round-trip; the resolver
/// treats it like a single morning dose.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Frequency {
    OnceDaily,
    TwiceDaily,
    ThreeTimesDaily,
    FourTimesDaily,
    AsNeeded,
    Other(String),
}

impl Frequency {
    /// The choices offered when adding a medicine.
    pub const KNOWN: [Frequency; 5] = [
        Frequency::OnceDaily,
        Frequency::TwiceDaily,
        Frequency::ThreeTimesDaily,
        Frequency::FourTimesDaily,
        Frequency::AsNeeded,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::OnceDaily => "once daily",
            Self::TwiceDaily => "twice daily",
            Self::ThreeTimesDaily => "three times daily",
            Self::FourTimesDaily => "four times daily",
            Self::AsNeeded => "as needed",
            Self::Other(label) => label,
        }
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Self::OnceDaily
    }
}

impl FromStr for Frequency {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "once daily" => Self::OnceDaily,
            "twice daily" => Self::TwiceDaily,
            "three times daily" => Self::ThreeTimesDaily,
            "four times daily" => Self::FourTimesDaily,
            "as needed" => Self::AsNeeded,
            _ => Self::Other(s.to_string()),
        })
    }
}

impl From<String> for Frequency {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(f) => f,
            Err(never) => match never {},
        }
    }
}

impl From<Frequency> for String {
    fn from(f: Frequency) -> Self {
        f.as_str().to_string()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
