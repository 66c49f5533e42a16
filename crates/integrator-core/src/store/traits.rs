//! Storage trait definition

use integrator_types::{Participant, Relation, RelationBag, RelationId};

use crate::error::StoreError;
use crate::leader::Leadership;

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Typed access to relation-scoped bags.
///
/// Reads never validate contents; callers check presence before use.
pub trait RelationStore: Send + Sync {
    /// First relation established on endpoint `name`
    fn relation(&self, name: &str) -> Option<Relation>;

    /// Relation by id, if it still exists
    fn relation_by_id(&self, id: RelationId) -> Option<Relation>;

    /// Full bag of `participant` on `relation`
    fn bag(&self, relation: RelationId, participant: &Participant) -> Option<RelationBag>;

    /// Single value from a participant's bag
    fn get(&self, relation: RelationId, participant: &Participant, key: &str) -> Option<String> {
        self.bag(relation, participant)
            .and_then(|bag| bag.get(key).map(str::to_string))
    }

    /// Write into the local application's bag.
    ///
    /// Returns whether the stored value changed.
    fn set(
        &self,
        leadership: &Leadership,
        relation: RelationId,
        key: &str,
        value: &str,
    ) -> StoreResult<bool>;
}
