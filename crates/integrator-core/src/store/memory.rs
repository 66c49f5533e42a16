//! In-memory relation store
//!
//! Stands in for the host's replicated bag store. Besides the
//! [`RelationStore`] contract it exposes the provider-side mutators the host
//! would normally perform (joining relations, remote bag writes), and can be
//! snapshotted so a hook runner can persist it between invocations.

use std::sync::atomic::{AtomicU64, Ordering};

use integrator_types::{Participant, Relation, RelationBag, RelationId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{RelationStore, StoreResult};
use crate::error::StoreError;
use crate::leader::Leadership;

/// One relation and the two bags visible to the local application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub relation: Relation,

    /// Local application bag
    #[serde(default)]
    pub local: RelationBag,

    /// Remote application bag
    #[serde(default)]
    pub remote: RelationBag,
}

/// Serializable image of every relation the unit knows about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub relations: Vec<RelationRecord>,

    /// Next relation id to hand out
    #[serde(default)]
    pub next_relation_id: u32,
}

/// In-memory storage for development, testing and the hook runner
#[derive(Debug, Default)]
pub struct InMemoryRelationStore {
    state: RwLock<StoreSnapshot>,
    local_writes: AtomicU64,
}

impl InMemoryRelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
            local_writes: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.read().clone()
    }

    /// Establish a relation on endpoint `name`. Ids are never reused.
    pub fn add_relation(&self, name: &str, remote_app: Option<&str>) -> RelationId {
        let mut state = self.state.write();
        let floor = state
            .relations
            .iter()
            .map(|r| r.relation.id.0 + 1)
            .max()
            .unwrap_or(0);
        let id = RelationId(state.next_relation_id.max(floor));
        state.next_relation_id = id.0 + 1;
        state.relations.push(RelationRecord {
            relation: Relation::new(id, name, remote_app.map(str::to_string)),
            local: RelationBag::new(),
            remote: RelationBag::new(),
        });
        debug!(relation = %id, endpoint = name, "relation added");
        id
    }

    /// Tear down a relation together with its bags.
    pub fn remove_relation(&self, id: RelationId) -> bool {
        let mut state = self.state.write();
        let before = state.relations.len();
        state.relations.retain(|r| r.relation.id != id);
        state.relations.len() != before
    }

    /// Write into the remote application's bag, as the provider would.
    pub fn set_remote(&self, id: RelationId, key: &str, value: &str) -> StoreResult<bool> {
        let mut state = self.state.write();
        let record = state
            .relations
            .iter_mut()
            .find(|r| r.relation.id == id)
            .ok_or(StoreError::RelationNotFound(id))?;
        Ok(record.remote.insert(key, value))
    }

    /// Number of local bag writes accepted, whether or not they changed data.
    pub fn local_write_count(&self) -> u64 {
        self.local_writes.load(Ordering::SeqCst)
    }
}

impl RelationStore for InMemoryRelationStore {
    fn relation(&self, name: &str) -> Option<Relation> {
        self.state
            .read()
            .relations
            .iter()
            .find(|r| r.relation.name == name)
            .map(|r| r.relation.clone())
    }

    fn relation_by_id(&self, id: RelationId) -> Option<Relation> {
        self.state
            .read()
            .relations
            .iter()
            .find(|r| r.relation.id == id)
            .map(|r| r.relation.clone())
    }

    fn bag(&self, relation: RelationId, participant: &Participant) -> Option<RelationBag> {
        let state = self.state.read();
        let record = state.relations.iter().find(|r| r.relation.id == relation)?;
        match participant {
            Participant::LocalApp => Some(record.local.clone()),
            Participant::RemoteApp(app)
                if record.relation.remote_app.as_deref() == Some(app.as_str()) =>
            {
                Some(record.remote.clone())
            }
            Participant::RemoteApp(_) => None,
        }
    }

    fn set(
        &self,
        _leadership: &Leadership,
        relation: RelationId,
        key: &str,
        value: &str,
    ) -> StoreResult<bool> {
        let mut state = self.state.write();
        let record = state
            .relations
            .iter_mut()
            .find(|r| r.relation.id == relation)
            .ok_or(StoreError::RelationNotFound(relation))?;
        self.local_writes.fetch_add(1, Ordering::SeqCst);
        Ok(record.local.insert(key, value))
    }
}
