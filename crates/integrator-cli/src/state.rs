//! Persisted unit state and the runtime built from it.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use integrator_core::{
    DeferredQueue, EventDispatcher, EventOutcome, InMemoryRelationStore, IntegratorConfig,
    LeadershipOracle, RecordingStatusSink, StaticLeadership, StoreSnapshot, SyncState,
};
use integrator_types::{Event, UnitStatus};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CliError, CliResult};

/// Everything a unit remembers between hook invocations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitState {
    #[serde(default)]
    pub leader: bool,
    #[serde(default)]
    pub store: StoreSnapshot,
    #[serde(default)]
    pub deferred: DeferredQueue,
    #[serde(default)]
    pub status: UnitStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UnitState {
    /// Load state from `path`; a missing file is a fresh unit.
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no state file, starting fresh");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| CliError::StateIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| CliError::StateCorrupt {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write state next to `path` and rename it into place.
    pub fn save(&mut self, path: &Path) -> CliResult<()> {
        self.updated_at = Some(Utc::now());
        let body = serde_json::to_string_pretty(self)?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let io_err = |source| CliError::StateIo {
            path: path.to_path_buf(),
            source,
        };
        fs::write(&tmp, body).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}

/// A live unit: the store, leadership flag and dispatcher rebuilt from
/// [`UnitState`] for the length of one invocation.
pub struct Unit {
    pub store: Arc<InMemoryRelationStore>,
    pub leadership: Arc<StaticLeadership>,
    pub status: Arc<RecordingStatusSink>,
    pub deferred: DeferredQueue,
    pub config: IntegratorConfig,
    dispatcher: EventDispatcher,
}

impl Unit {
    pub fn from_state(state: UnitState, config: IntegratorConfig) -> Self {
        let store = Arc::new(InMemoryRelationStore::from_snapshot(state.store));
        let leadership = Arc::new(StaticLeadership::new(state.leader));
        let status = Arc::new(RecordingStatusSink::with_initial(state.status));
        let dispatcher = EventDispatcher::new(
            config.clone(),
            store.clone(),
            leadership.clone(),
            status.clone(),
        );
        Self {
            store,
            leadership,
            status,
            deferred: state.deferred,
            config,
            dispatcher,
        }
    }

    pub fn into_state(self) -> UnitState {
        UnitState {
            leader: self.leadership.is_leader(),
            store: self.store.snapshot(),
            deferred: self.deferred,
            status: self.status.current(),
            updated_at: None,
        }
    }

    /// Redeliver deferred events, then handle `event`.
    pub fn process(&mut self, event: Event) -> CliResult<EventOutcome> {
        Ok(self.dispatcher.process(&mut self.deferred, event)?)
    }

    pub fn redeliver(&mut self) -> CliResult<Vec<EventOutcome>> {
        Ok(self.deferred.redeliver(&self.dispatcher)?)
    }

    pub fn sync_state(&self) -> SyncState {
        self.dispatcher.sync_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use integrator_types::{RelationEvent, RelationId};

    #[test]
    fn test_missing_file_is_fresh_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = UnitState::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(state, UnitState::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut unit = Unit::from_state(UnitState::default(), IntegratorConfig::default());
        unit.leadership.set(true);
        unit.store.add_relation("kafka-client", Some("kafka"));
        unit.deferred.push(Event::RelationChanged(RelationEvent::new(
            RelationId(1),
            "kafka-client",
            None,
        )));

        let mut state = unit.into_state();
        state.save(&path).unwrap();
        assert!(!dir.path().join("state.json.tmp").exists());

        let loaded = UnitState::load(&path).unwrap();
        assert!(loaded.leader);
        assert_eq!(loaded.store, state.store);
        assert_eq!(loaded.deferred.len(), 1);
        assert!(loaded.updated_at.is_some());
    }

    #[test]
    fn test_corrupt_state_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        let err = UnitState::load(&path).unwrap_err();
        assert!(matches!(err, CliError::StateCorrupt { .. }));
    }

    #[test]
    fn test_status_survives_round_trip() {
        let state = UnitState {
            status: UnitStatus::Waiting("waiting for kafka relation".into()),
            ..Default::default()
        };
        let unit = Unit::from_state(state, IntegratorConfig::default());
        assert_eq!(
            unit.into_state().status,
            UnitStatus::Waiting("waiting for kafka relation".into())
        );
    }
}
