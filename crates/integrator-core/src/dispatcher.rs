//! Event routing and deferred redelivery.

use std::collections::VecDeque;
use std::sync::Arc;

use integrator_types::{ActionName, Event, RelationEvent, UnitStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::actions::{ActionHandler, ActionSink, RecordedAction};
use crate::config::IntegratorConfig;
use crate::error::Result;
use crate::leader::{LeaderGate, LeadershipOracle};
use crate::status::StatusSink;
use crate::store::RelationStore;
use crate::sync::{CredentialSync, DeferReason, SyncOutcome, SyncReport, SyncState};

/// What happened to a dispatched event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum EventOutcome {
    Synced(SyncReport),
    Deferred(DeferReason),
    Action {
        name: ActionName,
        record: RecordedAction,
    },
    Ignored,
}

impl EventOutcome {
    pub fn is_deferred(&self) -> bool {
        matches!(self, EventOutcome::Deferred(_))
    }
}

impl From<SyncOutcome> for EventOutcome {
    fn from(outcome: SyncOutcome) -> Self {
        match outcome {
            SyncOutcome::Synced(report) => EventOutcome::Synced(report),
            SyncOutcome::Deferred(reason) => EventOutcome::Deferred(reason),
        }
    }
}

/// Routes host events to the sync state machine and the action handlers.
#[derive(Clone)]
pub struct EventDispatcher {
    config: Arc<IntegratorConfig>,
    store: Arc<dyn RelationStore>,
    status: Arc<dyn StatusSink>,
    sync: CredentialSync,
    actions: ActionHandler,
}

impl EventDispatcher {
    pub fn new(
        config: IntegratorConfig,
        store: Arc<dyn RelationStore>,
        leadership: Arc<dyn LeadershipOracle>,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        let config = Arc::new(config);
        let sync = CredentialSync::new(
            config.clone(),
            store.clone(),
            LeaderGate::new(leadership),
            status.clone(),
        );
        let actions = ActionHandler::new(config.clone(), store.clone());
        Self {
            config,
            store,
            status,
            sync,
            actions,
        }
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync.state()
    }

    /// Dispatch one event to completion.
    #[instrument(skip(self, event), fields(kind = event.kind()))]
    pub fn dispatch(&self, event: &Event) -> Result<EventOutcome> {
        match event {
            Event::RelationCreated(rel) | Event::RelationChanged(rel) => {
                if rel.name != self.config.kafka_relation {
                    debug!(endpoint = %rel.name, "no handler for endpoint");
                    return Ok(EventOutcome::Ignored);
                }
                Ok(self.sync.on_provider_event(rel)?.into())
            }
            Event::LeaderElected => self.on_leader_elected(),
            Event::Action { name } => {
                let mut record = RecordedAction::new();
                self.run_action(*name, &mut record);
                Ok(EventOutcome::Action {
                    name: *name,
                    record,
                })
            }
        }
    }

    /// Run an action against a host-supplied sink.
    pub fn run_action(&self, name: ActionName, sink: &mut dyn ActionSink) {
        self.actions.run(name, sink);
    }

    /// Redeliver deferred events, then dispatch `event`, queueing it if it
    /// defers.
    pub fn process(&self, queue: &mut DeferredQueue, event: Event) -> Result<EventOutcome> {
        queue.redeliver(self)?;
        let outcome = self.dispatch(&event)?;
        if outcome.is_deferred() {
            queue.push(event);
        }
        Ok(outcome)
    }

    fn on_leader_elected(&self) -> Result<EventOutcome> {
        let Some(kafka) = self.store.relation(&self.config.kafka_relation) else {
            self.status
                .set_status(UnitStatus::Waiting("waiting for kafka relation".to_string()));
            return Ok(EventOutcome::Ignored);
        };
        info!(relation = %kafka.id, "leader elected, resyncing credentials");
        let event = RelationEvent::new(kafka.id, kafka.name, kafka.remote_app);
        Ok(self.sync.on_provider_event(&event)?.into())
    }
}

/// Events waiting for their preconditions, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeferredQueue {
    events: VecDeque<Event>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event unless an identical one is already waiting.
    pub fn push(&mut self, event: Event) {
        if !self.events.contains(&event) {
            self.events.push_back(event);
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Re-dispatch every queued event in arrival order. Events that defer
    /// again stay queued.
    pub fn redeliver(&mut self, dispatcher: &EventDispatcher) -> Result<Vec<EventOutcome>> {
        let mut pending = std::mem::take(&mut self.events);
        let mut outcomes = Vec::with_capacity(pending.len());
        while let Some(event) = pending.pop_front() {
            match dispatcher.dispatch(&event) {
                Ok(outcome) => {
                    if outcome.is_deferred() {
                        self.events.push_back(event);
                    }
                    outcomes.push(outcome);
                }
                Err(err) => {
                    self.events.push_back(event);
                    self.events.extend(pending);
                    return Err(err);
                }
            }
        }
        if !self.events.is_empty() {
            debug!(remaining = self.events.len(), "events still deferred");
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leader::StaticLeadership;
    use crate::status::RecordingStatusSink;
    use crate::store::InMemoryRelationStore;
    use integrator_types::RelationId;

    fn dispatcher(
        leader: bool,
    ) -> (
        EventDispatcher,
        Arc<InMemoryRelationStore>,
        Arc<StaticLeadership>,
        Arc<RecordingStatusSink>,
    ) {
        let store = Arc::new(InMemoryRelationStore::new());
        let leadership = Arc::new(StaticLeadership::new(leader));
        let status = Arc::new(RecordingStatusSink::new());
        let dispatcher = EventDispatcher::new(
            IntegratorConfig::default(),
            store.clone(),
            leadership.clone(),
            status.clone(),
        );
        (dispatcher, store, leadership, status)
    }

    fn changed(id: RelationId) -> Event {
        Event::RelationChanged(RelationEvent::new(id, "kafka-client", Some("kafka".into())))
    }

    #[test]
    fn test_peer_relation_events_ignored() {
        let (dispatcher, store, _, _) = dispatcher(true);
        let peer = store.add_relation("cluster", None);

        let event = Event::RelationCreated(RelationEvent::new(peer, "cluster", None));
        assert_eq!(dispatcher.dispatch(&event).unwrap(), EventOutcome::Ignored);
        assert_eq!(store.local_write_count(), 0);
    }

    #[test]
    fn test_action_event_records_failure() {
        let (dispatcher, _, _, _) = dispatcher(false);

        let outcome = dispatcher
            .dispatch(&Event::Action {
                name: ActionName::GetTopic,
            })
            .unwrap();
        let EventOutcome::Action { record, .. } = outcome else {
            panic!("expected action outcome");
        };
        assert_eq!(
            record.failure.as_deref(),
            Some("integrator not related to kafka")
        );
    }

    #[test]
    fn test_leader_elected_without_kafka_waits() {
        let (dispatcher, _, _, status) = dispatcher(true);

        let outcome = dispatcher.dispatch(&Event::LeaderElected).unwrap();
        assert_eq!(outcome, EventOutcome::Ignored);
        assert_eq!(
            status.current(),
            UnitStatus::Waiting("waiting for kafka relation".into())
        );
    }

    #[test]
    fn test_leader_elected_resyncs() {
        let (dispatcher, store, _, _) = dispatcher(true);
        store.add_relation("cluster", None);
        let kafka = store.add_relation("kafka-client", Some("kafka"));
        store.set_remote(kafka, "username", "u").unwrap();

        let outcome = dispatcher.dispatch(&Event::LeaderElected).unwrap();
        let EventOutcome::Synced(report) = outcome else {
            panic!("expected sync");
        };
        assert_eq!(report.credentials.username, "u");
    }

    #[test]
    fn test_deferred_event_redelivered_once_peer_forms() {
        let (dispatcher, store, _, _) = dispatcher(true);
        let kafka = store.add_relation("kafka-client", Some("kafka"));
        let mut queue = DeferredQueue::new();

        let outcome = dispatcher.process(&mut queue, changed(kafka)).unwrap();
        assert_eq!(outcome, EventOutcome::Deferred(DeferReason::PeerRelationMissing));
        assert_eq!(queue.len(), 1);

        let peer = store.add_relation("cluster", None);
        let peer_created = Event::RelationCreated(RelationEvent::new(peer, "cluster", None));
        let outcome = dispatcher.process(&mut queue, peer_created).unwrap();
        assert_eq!(outcome, EventOutcome::Ignored);
        assert!(queue.is_empty());
        assert_eq!(dispatcher.sync_state(), SyncState::AwaitingProvider);
    }

    #[test]
    fn test_identical_deferred_events_queued_once() {
        let (dispatcher, store, leadership, _) = dispatcher(false);
        store.add_relation("cluster", None);
        let kafka = store.add_relation("kafka-client", Some("kafka"));
        let mut queue = DeferredQueue::new();

        dispatcher.process(&mut queue, changed(kafka)).unwrap();
        dispatcher.process(&mut queue, changed(kafka)).unwrap();
        assert_eq!(queue.len(), 1);

        leadership.set(true);
        let outcomes = queue.redeliver(&dispatcher).unwrap();
        assert!(matches!(outcomes.as_slice(), [EventOutcome::Synced(_)]));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_round_trips_through_json() {
        let mut queue = DeferredQueue::new();
        queue.push(changed(RelationId(1)));
        queue.push(Event::LeaderElected);

        let json = serde_json::to_string(&queue).unwrap();
        let back: DeferredQueue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, queue);
    }
}
