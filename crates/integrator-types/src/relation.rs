//! Relation handles and participants.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Host-assigned relation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationId(pub u32);

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A relation as seen from the local application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,

    /// Endpoint name, e.g. `kafka-client` or `cluster`
    pub name: String,

    /// Remote application; `None` for peer relations or before it joins
    pub remote_app: Option<String>,
}

impl Relation {
    pub fn new(id: RelationId, name: impl Into<String>, remote_app: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            remote_app,
        }
    }
}

/// Owner of a bag on a relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "app", rename_all = "kebab-case")]
pub enum Participant {
    /// The local application; writable by the leader only
    LocalApp,
    /// A remote application; read-only locally
    RemoteApp(String),
}
