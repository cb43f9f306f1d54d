use core::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol revision whose formula set applies to a state.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Revision {
    Phase0,
    Altair,
    Bellatrix,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized revision tag: {0}")]
pub struct UnknownRevision(pub String);

impl Revision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Phase0 => "phase0",
            Self::Altair => "altair",
            Self::Bellatrix => "bellatrix",
        }
    }
}

impl FromStr for Revision {
    type Err = UnknownRevision;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.to_ascii_lowercase().as_str() {
            "phase0" => Ok(Self::Phase0),
            "altair" => Ok(Self::Altair),
            "bellatrix" => Ok(Self::Bellatrix),
            _ => Err(UnknownRevision(tag.to_owned())),
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
