//! Integrator Types - Shared vocabulary for Kafka credential brokering
//!
//! The integrator sits between a Kafka-providing application and a downstream
//! consumer of credentials. Both sides talk through relation-scoped key/value
//! bags; this crate holds the types every other crate agrees on.
//!
//! ## Key Concepts
//!
//! - **RelationBag**: insertion-ordered string map owned by one participant
//! - **CredentialSet**: credentials assembled from the peer cache
//! - **Event**: lifecycle and action events delivered by the host
//! - **UnitStatus**: status reported back to the host
//! - **keys**: the wire contract with the Kafka provider

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod bag;
pub mod credentials;
pub mod event;
pub mod keys;
pub mod relation;
pub mod status;

pub use bag::RelationBag;
pub use credentials::{tls_enabled, CredentialSet, MandatoryField, SecurityProtocol};
pub use event::{ActionName, Event, RelationEvent, UnknownAction};
pub use relation::{Participant, Relation, RelationId};
pub use status::UnitStatus;
