//! Credential synchronisation.
//!
//! Reconciles the provider relation with the peer cache. The state machine is
//! never stored; [`CredentialSync::state`] derives it from the bags:
//!
//! - `Uninitialized`: no peer relation yet
//! - `AwaitingProvider`: peer relation present, cache incomplete or stale
//! - `Ready`: cache complete and mirroring the provider bag
//!
//! A sync runs only on the leader, only when the provider relation, its remote
//! application and the peer relation all exist. Anything else is a deferral:
//! the host redelivers the event later and the check runs again.

use std::fmt;
use std::sync::Arc;

use integrator_types::{
    keys, CredentialSet, Participant, RelationBag, RelationEvent, RelationId, UnitStatus,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::config::IntegratorConfig;
use crate::error::Result;
use crate::leader::{LeaderGate, Leadership};
use crate::status::StatusSink;
use crate::store::RelationStore;

/// Derived protocol state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncState {
    Uninitialized,
    AwaitingProvider,
    Ready,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Uninitialized => write!(f, "uninitialized"),
            SyncState::AwaitingProvider => write!(f, "awaiting-provider"),
            SyncState::Ready => write!(f, "ready"),
        }
    }
}

/// Why a sync was postponed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "relation", rename_all = "kebab-case")]
pub enum DeferReason {
    NotLeader,
    RelationMissing(RelationId),
    RemoteAppUnknown(RelationId),
    PeerRelationMissing,
}

impl fmt::Display for DeferReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeferReason::NotLeader => write!(f, "unit is not leader"),
            DeferReason::RelationMissing(id) => write!(f, "relation {} is gone", id),
            DeferReason::RemoteAppUnknown(id) => {
                write!(f, "remote application on relation {} not known yet", id)
            }
            DeferReason::PeerRelationMissing => write!(f, "peer relation not formed yet"),
        }
    }
}

/// Result of a completed sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub relation: RelationId,

    /// Credentials as now held in the peer cache
    pub credentials: CredentialSet,

    /// Provider-relation entries that changed
    pub request_changes: usize,

    /// Peer-cache entries that changed
    pub cache_changes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum SyncOutcome {
    Synced(SyncReport),
    Deferred(DeferReason),
}

/// Raw provider fields, copied verbatim into the peer cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ProviderFields {
    username: String,
    password: String,
    uris: String,
    consumer_group_prefix: String,
    tls: String,
}

impl ProviderFields {
    fn read(bag: &RelationBag) -> Self {
        Self {
            username: bag.get_or_empty(keys::USERNAME).to_string(),
            password: bag.get_or_empty(keys::PASSWORD).to_string(),
            uris: bag.get_or_empty(keys::URIS).to_string(),
            consumer_group_prefix: bag.get_or_empty(keys::CONSUMER_GROUP_PREFIX).to_string(),
            tls: bag.get_or_empty(keys::TLS).to_string(),
        }
    }

    /// Peer cache entries in write order.
    fn cache_entries<'a>(&'a self, topic: &'a str) -> [(&'static str, &'a str); 6] {
        [
            (keys::USERNAME, self.username.as_str()),
            (keys::PASSWORD, self.password.as_str()),
            (keys::BOOTSTRAP_SERVER, self.uris.as_str()),
            (keys::CONSUMER_GROUP_PREFIX, self.consumer_group_prefix.as_str()),
            (keys::TLS, self.tls.as_str()),
            (keys::TOPIC, topic),
        ]
    }
}

/// Preconditions that held when a sync was admitted.
struct Admitted {
    leadership: Leadership,
    provider: RelationId,
    provider_bag: RelationBag,
    peer: RelationId,
}

/// Mirrors provider credentials into the peer cache and publishes the
/// integrator's request back to the provider.
#[derive(Clone)]
pub struct CredentialSync {
    config: Arc<IntegratorConfig>,
    store: Arc<dyn RelationStore>,
    gate: LeaderGate,
    status: Arc<dyn StatusSink>,
}

impl CredentialSync {
    pub fn new(
        config: Arc<IntegratorConfig>,
        store: Arc<dyn RelationStore>,
        gate: LeaderGate,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            config,
            store,
            gate,
            status,
        }
    }

    /// Handle a provider relation created/changed event.
    #[instrument(skip(self), fields(relation = %event.relation))]
    pub fn on_provider_event(&self, event: &RelationEvent) -> Result<SyncOutcome> {
        let admitted = match self.admit(event) {
            Ok(admitted) => admitted,
            Err(reason) => {
                info!(reason = %reason, "deferring credential sync");
                return Ok(SyncOutcome::Deferred(reason));
            }
        };

        let fields = ProviderFields::read(&admitted.provider_bag);

        info!("publishing credential request to kafka");
        let roles = self.config.extra_user_roles_value();
        let mut request_changes = 0;
        for (key, value) in [
            (keys::EXTRA_USER_ROLES, roles.as_str()),
            (keys::TOPIC, self.config.topic.as_str()),
        ] {
            if self
                .store
                .set(&admitted.leadership, admitted.provider, key, value)?
            {
                request_changes += 1;
            }
        }

        let mut cache_changes = 0;
        for (key, value) in fields.cache_entries(&self.config.topic) {
            if self
                .store
                .set(&admitted.leadership, admitted.peer, key, value)?
            {
                cache_changes += 1;
            }
        }

        let credentials = self.cached_credentials(admitted.peer);
        debug!(
            complete = credentials.is_complete(),
            request_changes, cache_changes, "peer cache updated"
        );

        self.status.set_status(UnitStatus::Active);

        Ok(SyncOutcome::Synced(SyncReport {
            relation: admitted.provider,
            credentials,
            request_changes,
            cache_changes,
        }))
    }

    /// Derive the current protocol state from the bags.
    pub fn state(&self) -> SyncState {
        let Some(peer) = self.store.relation(&self.config.peer_relation) else {
            return SyncState::Uninitialized;
        };
        let cache = self
            .store
            .bag(peer.id, &Participant::LocalApp)
            .unwrap_or_default();
        if !CredentialSet::from_peer_cache(&cache).is_complete() {
            return SyncState::AwaitingProvider;
        }

        let provider = self
            .store
            .relation(&self.config.kafka_relation)
            .and_then(|rel| {
                let app = rel.remote_app?;
                self.store.bag(rel.id, &Participant::RemoteApp(app))
            })
            .map(|bag| ProviderFields::read(&bag));

        let mirrored = provider.is_some_and(|fields| {
            fields
                .cache_entries(&self.config.topic)
                .into_iter()
                .all(|(key, value)| cache.get_or_empty(key) == value)
        });

        if mirrored {
            SyncState::Ready
        } else {
            SyncState::AwaitingProvider
        }
    }

    fn admit(&self, event: &RelationEvent) -> std::result::Result<Admitted, DeferReason> {
        let leadership = self.gate.check().ok_or(DeferReason::NotLeader)?;

        let provider = self
            .store
            .relation_by_id(event.relation)
            .ok_or(DeferReason::RelationMissing(event.relation))?;

        // The event's app must own the relation's remote bag.
        let remote_app = match (&event.app, &provider.remote_app) {
            (Some(app), Some(known)) if app != known => None,
            (app, known) => app.clone().or_else(|| known.clone()),
        }
        .ok_or(DeferReason::RemoteAppUnknown(event.relation))?;
        let provider_bag = self
            .store
            .bag(provider.id, &Participant::RemoteApp(remote_app))
            .ok_or(DeferReason::RemoteAppUnknown(event.relation))?;

        let peer = self
            .store
            .relation(&self.config.peer_relation)
            .ok_or(DeferReason::PeerRelationMissing)?;

        Ok(Admitted {
            leadership,
            provider: provider.id,
            provider_bag,
            peer: peer.id,
        })
    }

    fn cached_credentials(&self, peer: RelationId) -> CredentialSet {
        self.store
            .bag(peer, &Participant::LocalApp)
            .map(|bag| CredentialSet::from_peer_cache(&bag))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leader::StaticLeadership;
    use crate::status::RecordingStatusSink;
    use crate::store::InMemoryRelationStore;

    struct Harness {
        store: Arc<InMemoryRelationStore>,
        leadership: Arc<StaticLeadership>,
        status: Arc<RecordingStatusSink>,
        sync: CredentialSync,
    }

    fn harness(leader: bool) -> Harness {
        let store = Arc::new(InMemoryRelationStore::new());
        let leadership = Arc::new(StaticLeadership::new(leader));
        let status = Arc::new(RecordingStatusSink::new());
        let sync = CredentialSync::new(
            Arc::new(IntegratorConfig::default()),
            store.clone(),
            LeaderGate::new(leadership.clone()),
            status.clone(),
        );
        Harness {
            store,
            leadership,
            status,
            sync,
        }
    }

    fn kafka_event(id: RelationId) -> RelationEvent {
        RelationEvent::new(id, "kafka-client", Some("kafka".into()))
    }

    fn provide(store: &InMemoryRelationStore, id: RelationId, entries: &[(&str, &str)]) {
        for (k, v) in entries {
            store.set_remote(id, k, v).unwrap();
        }
    }

    #[test]
    fn test_sync_mirrors_provider_into_peer_cache() {
        let h = harness(true);
        let peer = h.store.add_relation("cluster", None);
        let kafka = h.store.add_relation("kafka-client", Some("kafka"));
        provide(
            &h.store,
            kafka,
            &[
                ("username", "u"),
                ("password", "p"),
                ("uris", "host:9092"),
                ("tls", "enabled"),
            ],
        );

        let outcome = h.sync.on_provider_event(&kafka_event(kafka)).unwrap();
        let SyncOutcome::Synced(report) = outcome else {
            panic!("expected sync");
        };
        assert!(report.credentials.is_complete());
        assert!(report.credentials.tls);

        let cache = h.store.bag(peer, &Participant::LocalApp).unwrap();
        assert_eq!(cache.get("username"), Some("u"));
        assert_eq!(cache.get("password"), Some("p"));
        assert_eq!(cache.get("bootstrap-server"), Some("host:9092"));
        assert_eq!(cache.get("topic"), Some("demo"));
        assert_eq!(cache.get("tls"), Some("enabled"));
        assert_eq!(cache.get("consumer-group-prefix"), Some(""));
        assert_eq!(cache.len(), 6);

        let request = h.store.bag(kafka, &Participant::LocalApp).unwrap();
        assert_eq!(request.get("extra-user-roles"), Some("admin,consumer,producer"));
        assert_eq!(request.get("topic"), Some("demo"));

        assert_eq!(h.status.current(), UnitStatus::Active);
        assert_eq!(h.sync.state(), SyncState::Ready);
    }

    #[test]
    fn test_non_leader_defers_without_writes() {
        let h = harness(false);
        h.store.add_relation("cluster", None);
        let kafka = h.store.add_relation("kafka-client", Some("kafka"));
        provide(&h.store, kafka, &[("username", "u")]);

        let outcome = h.sync.on_provider_event(&kafka_event(kafka)).unwrap();
        assert_eq!(outcome, SyncOutcome::Deferred(DeferReason::NotLeader));
        assert_eq!(h.store.local_write_count(), 0);
        assert!(h.status.history().is_empty());
    }

    #[test]
    fn test_missing_peer_relation_defers() {
        let h = harness(true);
        let kafka = h.store.add_relation("kafka-client", Some("kafka"));

        let outcome = h.sync.on_provider_event(&kafka_event(kafka)).unwrap();
        assert_eq!(outcome, SyncOutcome::Deferred(DeferReason::PeerRelationMissing));
        assert_eq!(h.store.local_write_count(), 0);
        assert_eq!(h.sync.state(), SyncState::Uninitialized);
    }

    #[test]
    fn test_vanished_relation_defers() {
        let h = harness(true);
        h.store.add_relation("cluster", None);

        let outcome = h.sync.on_provider_event(&kafka_event(RelationId(42))).unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Deferred(DeferReason::RelationMissing(RelationId(42)))
        );
    }

    #[test]
    fn test_unknown_remote_app_defers() {
        let h = harness(true);
        h.store.add_relation("cluster", None);
        let kafka = h.store.add_relation("kafka-client", None);

        let event = RelationEvent::new(kafka, "kafka-client", None);
        let outcome = h.sync.on_provider_event(&event).unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Deferred(DeferReason::RemoteAppUnknown(kafka))
        );
    }

    #[test]
    fn test_mismatched_remote_app_defers_and_keeps_cache() {
        let h = harness(true);
        let peer = h.store.add_relation("cluster", None);
        let kafka = h.store.add_relation("kafka-client", Some("kafka"));
        provide(
            &h.store,
            kafka,
            &[("username", "u"), ("password", "p"), ("uris", "host:9092")],
        );
        h.sync.on_provider_event(&kafka_event(kafka)).unwrap();
        let before = h.store.bag(peer, &Participant::LocalApp).unwrap();

        let stranger = RelationEvent::new(kafka, "kafka-client", Some("other".into()));
        let outcome = h.sync.on_provider_event(&stranger).unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Deferred(DeferReason::RemoteAppUnknown(kafka))
        );
        assert_eq!(h.store.bag(peer, &Participant::LocalApp).unwrap(), before);
        assert_eq!(h.sync.state(), SyncState::Ready);
    }

    #[test]
    fn test_event_app_on_relation_without_known_app_defers() {
        let h = harness(true);
        h.store.add_relation("cluster", None);
        let kafka = h.store.add_relation("kafka-client", None);

        let outcome = h.sync.on_provider_event(&kafka_event(kafka)).unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Deferred(DeferReason::RemoteAppUnknown(kafka))
        );
        assert_eq!(h.store.local_write_count(), 0);
    }

    #[test]
    fn test_leadership_rechecked_on_retry() {
        let h = harness(false);
        h.store.add_relation("cluster", None);
        let kafka = h.store.add_relation("kafka-client", Some("kafka"));
        let event = kafka_event(kafka);

        assert!(matches!(
            h.sync.on_provider_event(&event).unwrap(),
            SyncOutcome::Deferred(DeferReason::NotLeader)
        ));
        h.leadership.set(true);
        assert!(matches!(
            h.sync.on_provider_event(&event).unwrap(),
            SyncOutcome::Synced(_)
        ));
    }

    #[test]
    fn test_second_sync_changes_nothing() {
        let h = harness(true);
        let peer = h.store.add_relation("cluster", None);
        let kafka = h.store.add_relation("kafka-client", Some("kafka"));
        provide(&h.store, kafka, &[("username", "u"), ("uris", "host:9092")]);
        let event = kafka_event(kafka);

        h.sync.on_provider_event(&event).unwrap();
        let first = h.store.bag(peer, &Participant::LocalApp).unwrap();

        let SyncOutcome::Synced(report) = h.sync.on_provider_event(&event).unwrap() else {
            panic!("expected sync");
        };
        assert_eq!(report.cache_changes, 0);
        assert_eq!(report.request_changes, 0);
        assert_eq!(h.store.bag(peer, &Participant::LocalApp).unwrap(), first);
    }

    #[test]
    fn test_later_change_overwrites_partial_cache() {
        let h = harness(true);
        let peer = h.store.add_relation("cluster", None);
        let kafka = h.store.add_relation("kafka-client", Some("kafka"));
        let event = kafka_event(kafka);

        provide(&h.store, kafka, &[("username", "u")]);
        h.sync.on_provider_event(&event).unwrap();
        assert_eq!(h.sync.state(), SyncState::AwaitingProvider);

        provide(
            &h.store,
            kafka,
            &[("username", "u2"), ("password", "p"), ("uris", "b:9093")],
        );
        h.sync.on_provider_event(&event).unwrap();

        let cache = h.store.bag(peer, &Participant::LocalApp).unwrap();
        assert_eq!(cache.get("username"), Some("u2"));
        assert_eq!(cache.get("bootstrap-server"), Some("b:9093"));
        assert_eq!(h.sync.state(), SyncState::Ready);
    }

    #[test]
    fn test_state_stale_after_provider_rotates_password() {
        let h = harness(true);
        h.store.add_relation("cluster", None);
        let kafka = h.store.add_relation("kafka-client", Some("kafka"));
        provide(
            &h.store,
            kafka,
            &[("username", "u"), ("password", "p"), ("uris", "host:9092")],
        );
        h.sync.on_provider_event(&kafka_event(kafka)).unwrap();
        assert_eq!(h.sync.state(), SyncState::Ready);

        provide(&h.store, kafka, &[("password", "rotated")]);
        assert_eq!(h.sync.state(), SyncState::AwaitingProvider);
    }
}
