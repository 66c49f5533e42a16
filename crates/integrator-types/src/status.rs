//! Unit status reported to the host.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum UnitStatus {
    #[default]
    Unknown,
    Active,
    Waiting(String),
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStatus::Unknown => write!(f, "unknown"),
            UnitStatus::Active => write!(f, "active"),
            UnitStatus::Waiting(message) => write!(f, "waiting: {}", message),
        }
    }
}
