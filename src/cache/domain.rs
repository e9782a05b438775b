//! Cache Domain Module
//!
//! The fixed set of logical caches the facade owns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

// == Domain ==
/// One independently configured logical cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Ticket lists and other collection-shaped query results
    Collections,
    /// Individual tickets
    Entities,
    /// Users and other principals
    Principals,
}

impl Domain {
    /// Every domain, in the fixed order used for lock acquisition.
    pub const ALL: [Domain; 3] = [Domain::Collections, Domain::Entities, Domain::Principals];

    /// Name used in stats output and administrative calls.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Collections => "collections",
            Domain::Entities => "entities",
            Domain::Principals => "principals",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Domain::Collections => 0,
            Domain::Entities => 1,
            Domain::Principals => 2,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for Domain {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "collections" => Ok(Domain::Collections),
            "entities" => Ok(Domain::Entities),
            "principals" => Ok(Domain::Principals),
            other => Err(CacheError::UnknownDomain(other.to_string())),
        }
    }
}
