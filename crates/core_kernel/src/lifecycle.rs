//! Entity lifecycle state
//!
//! Every persisted entity carries an explicit lifecycle state instead of a
//! scattered boolean flag. Repositories exclude `Archived` rows by default;
//! archival is the only soft-delete mechanism in the system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a persisted entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Visible to all default queries
    Active,
    /// Soft-deleted; excluded from default queries, never physically removed
    Archived,
}

impl Lifecycle {
    /// Returns true when the entity participates in default queries
    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active)
    }

    /// Returns the storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Active => "active",
            Lifecycle::Archived => "archived",
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Lifecycle::Active
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Lifecycle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Lifecycle::Active),
            "archived" => Ok(Lifecycle::Archived),
            other => Err(format!("unknown lifecycle state '{}'", other)),
        }
    }
}
