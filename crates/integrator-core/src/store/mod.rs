//! Relation bag storage.
//!
//! The host replicates bags between relation members; the core only sees a
//! [`RelationStore`].

mod memory;
mod traits;

pub use memory::{InMemoryRelationStore, RelationRecord, StoreSnapshot};
pub use traits::{RelationStore, StoreResult};
