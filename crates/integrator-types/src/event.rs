//! Events delivered by the host runtime.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::relation::RelationId;

/// Inbound event. Events are plain data so deferred ones can be persisted and
/// redelivered later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    /// A relation was established
    RelationCreated(RelationEvent),

    /// A remote participant changed its bag
    RelationChanged(RelationEvent),

    /// This unit became leader
    LeaderElected,

    /// An operator invoked an action
    Action { name: ActionName },
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::RelationCreated(_) => "relation-created",
            Event::RelationChanged(_) => "relation-changed",
            Event::LeaderElected => "leader-elected",
            Event::Action { .. } => "action",
        }
    }
}

/// Payload of relation lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationEvent {
    pub relation: RelationId,

    /// Endpoint name the relation belongs to
    pub name: String,

    /// Remote application that triggered the event, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
}

impl RelationEvent {
    pub fn new(relation: RelationId, name: impl Into<String>, app: Option<String>) -> Self {
        Self {
            relation,
            name: name.into(),
            app,
        }
    }
}

/// Operator actions exposed by the integrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionName {
    GetTopic,
    GetBootstrapServer,
    GetUsername,
    GetPassword,
    GetData,
}

impl ActionName {
    pub const ALL: [ActionName; 5] = [
        ActionName::GetTopic,
        ActionName::GetBootstrapServer,
        ActionName::GetUsername,
        ActionName::GetPassword,
        ActionName::GetData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionName::GetTopic => "get-topic",
            ActionName::GetBootstrapServer => "get-bootstrap-server",
            ActionName::GetUsername => "get-username",
            ActionName::GetPassword => "get-password",
            ActionName::GetData => "get-data",
        }
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for ActionName {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}
