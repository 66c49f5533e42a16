//! # Integrator Core - Kafka credential negotiation and caching
//!
//! The integrator requests a topic and ACL roles from a Kafka provider over
//! the provider relation, mirrors the credentials it receives into a peer
//! relation shared by every unit of the application, and hands them to
//! operators through actions.
//!
//! ## Key Components
//!
//! - [`RelationStore`]: typed access to relation-scoped bags
//! - [`LeaderGate`]: leader-only writes, re-checked on every event
//! - [`CredentialSync`]: provider relation → peer cache state machine
//! - [`ActionHandler`]: validated, read-only operator queries
//! - [`EventDispatcher`]: routes host events, redelivers deferred ones
//!
//! ## Deferral
//!
//! Nothing in the core blocks or retries on its own. When a sync cannot run
//! yet (not leader, peer relation missing, provider relation gone) the
//! handler returns [`SyncOutcome::Deferred`]; the host keeps the event in a
//! [`DeferredQueue`] and redelivers it before the next one.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use integrator_core::{
//!     EventDispatcher, EventOutcome, InMemoryRelationStore, IntegratorConfig,
//!     RecordingStatusSink, StaticLeadership,
//! };
//! use integrator_types::{Event, RelationEvent};
//!
//! let store = Arc::new(InMemoryRelationStore::new());
//! let dispatcher = EventDispatcher::new(
//!     IntegratorConfig::default(),
//!     store.clone(),
//!     Arc::new(StaticLeadership::new(true)),
//!     Arc::new(RecordingStatusSink::new()),
//! );
//!
//! store.add_relation("cluster", None);
//! let kafka = store.add_relation("kafka-client", Some("kafka"));
//! store.set_remote(kafka, "username", "admin").unwrap();
//!
//! let event = Event::RelationChanged(RelationEvent::new(kafka, "kafka-client", Some("kafka".into())));
//! assert!(matches!(dispatcher.dispatch(&event).unwrap(), EventOutcome::Synced(_)));
//! ```

pub mod actions;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod leader;
pub mod status;
pub mod store;
pub mod sync;

pub use actions::{ActionError, ActionHandler, ActionReply, ActionResults, ActionSink, RecordedAction};
pub use config::{IntegratorConfig, LoggingConfig};
pub use dispatcher::{DeferredQueue, EventDispatcher, EventOutcome};
pub use error::{IntegratorError, Result, StoreError};
pub use leader::{LeaderGate, Leadership, LeadershipOracle, StaticLeadership};
pub use status::{RecordingStatusSink, StatusSink};
pub use store::{InMemoryRelationStore, RelationRecord, RelationStore, StoreSnapshot};
pub use sync::{CredentialSync, DeferReason, SyncOutcome, SyncReport, SyncState};
