//! Operator actions.
//!
//! Read-only queries over the relation bags. Each action either hands back
//! a result map or fails with a message naming what is missing; operators
//! re-run the action once the provider has finished.

use std::collections::BTreeMap;
use std::sync::Arc;

use integrator_types::{keys, ActionName, CredentialSet, MandatoryField, Participant, Relation};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::IntegratorConfig;
use crate::store::RelationStore;

/// Result map handed to the operator.
pub type ActionResults = BTreeMap<String, String>;

/// Action failures, reported verbatim to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{app} not related to kafka")]
    NotRelated { app: String },

    #[error("{app} peer relation not available")]
    PeerUnavailable { app: String },

    #[error("{0} not found...")]
    Missing(MandatoryField),
}

/// Channel back to the invoking operator.
pub trait ActionSink {
    fn log(&mut self, message: &str);
    fn set_results(&mut self, results: ActionResults);
    fn fail(&mut self, message: &str);
}

/// Action sink that records everything it is told.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordedAction {
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<ActionResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl RecordedAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none() && self.results.is_some()
    }
}

impl ActionSink for RecordedAction {
    fn log(&mut self, message: &str) {
        self.logs.push(message.to_string());
    }

    fn set_results(&mut self, results: ActionResults) {
        self.results = Some(results);
    }

    fn fail(&mut self, message: &str) {
        self.failure = Some(message.to_string());
    }
}

/// Successful action payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReply {
    pub log: &'static str,
    pub results: ActionResults,
}

impl ActionReply {
    fn single(log: &'static str, key: &str, value: String) -> Self {
        Self {
            log,
            results: BTreeMap::from([(key.to_string(), value)]),
        }
    }
}

/// Query handlers over the peer cache and the provider bag.
#[derive(Clone)]
pub struct ActionHandler {
    config: Arc<IntegratorConfig>,
    store: Arc<dyn RelationStore>,
}

impl ActionHandler {
    pub fn new(config: Arc<IntegratorConfig>, store: Arc<dyn RelationStore>) -> Self {
        Self { config, store }
    }

    /// Run an action and report through `sink`.
    ///
    /// Returns the failure, if any, so callers can record the outcome.
    pub fn run(&self, name: ActionName, sink: &mut dyn ActionSink) -> Option<ActionError> {
        match self.query(name) {
            Ok(reply) => {
                debug!(action = %name, "action succeeded");
                sink.log(reply.log);
                sink.set_results(reply.results);
                None
            }
            Err(err) => {
                warn!(action = %name, error = %err, "action failed");
                sink.fail(&err.to_string());
                Some(err)
            }
        }
    }

    pub fn query(&self, name: ActionName) -> Result<ActionReply, ActionError> {
        match name {
            ActionName::GetTopic => self.get_topic(),
            ActionName::GetBootstrapServer => self.get_bootstrap_server(),
            ActionName::GetUsername => self.get_username(),
            ActionName::GetPassword => self.get_password(),
            ActionName::GetData => self.get_data(),
        }
    }

    /// Topic recorded in the peer cache.
    pub fn get_topic(&self) -> Result<ActionReply, ActionError> {
        self.kafka_relation()?;
        let topic = self.cached(keys::TOPIC);
        if topic.is_empty() {
            return Err(ActionError::Missing(MandatoryField::Topic));
        }
        Ok(ActionReply::single("Topic found...", keys::TOPIC, topic))
    }

    pub fn get_bootstrap_server(&self) -> Result<ActionReply, ActionError> {
        let value = self.provided(keys::URIS)?;
        if value.is_empty() {
            return Err(ActionError::Missing(MandatoryField::BootstrapServer));
        }
        Ok(ActionReply::single(
            "Bootstrap-Server found...",
            keys::BOOTSTRAP_SERVER,
            value,
        ))
    }

    pub fn get_username(&self) -> Result<ActionReply, ActionError> {
        let value = self.provided(keys::USERNAME)?;
        if value.is_empty() {
            return Err(ActionError::Missing(MandatoryField::Username));
        }
        Ok(ActionReply::single("Username found...", keys::USERNAME, value))
    }

    pub fn get_password(&self) -> Result<ActionReply, ActionError> {
        let value = self.provided(keys::PASSWORD)?;
        if value.is_empty() {
            return Err(ActionError::Missing(MandatoryField::Password));
        }
        Ok(ActionReply::single("Password found...", keys::PASSWORD, value))
    }

    /// Full credential set from the peer cache.
    ///
    /// Mandatory fields are checked in [`MandatoryField::CHECK_ORDER`]; the
    /// first gap is the one reported.
    pub fn get_data(&self) -> Result<ActionReply, ActionError> {
        let peer = self
            .store
            .relation(&self.config.peer_relation)
            .ok_or_else(|| ActionError::PeerUnavailable {
                app: self.config.app_name.clone(),
            })?;
        self.kafka_relation()?;

        let cache = self
            .store
            .bag(peer.id, &Participant::LocalApp)
            .unwrap_or_default();
        let credentials = CredentialSet::from_peer_cache(&cache);
        if let Some(field) = credentials.first_missing() {
            return Err(ActionError::Missing(field));
        }

        Ok(ActionReply {
            log: "Credentials found...",
            results: credentials.to_results(),
        })
    }

    fn not_related(&self) -> ActionError {
        ActionError::NotRelated {
            app: self.config.app_name.clone(),
        }
    }

    fn kafka_relation(&self) -> Result<Relation, ActionError> {
        self.store
            .relation(&self.config.kafka_relation)
            .ok_or_else(|| self.not_related())
    }

    /// Value from the provider's bag; requires its remote application.
    fn provided(&self, key: &str) -> Result<String, ActionError> {
        let relation = self.kafka_relation()?;
        let app = relation.remote_app.ok_or_else(|| self.not_related())?;
        Ok(self
            .store
            .get(relation.id, &Participant::RemoteApp(app), key)
            .unwrap_or_default())
    }

    /// Value from the peer cache; empty when the peer relation is absent.
    fn cached(&self, key: &str) -> String {
        self.store
            .relation(&self.config.peer_relation)
            .and_then(|peer| self.store.get(peer.id, &Participant::LocalApp, key))
            .unwrap_or_default()
    }
}
