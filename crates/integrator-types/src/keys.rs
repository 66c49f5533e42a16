//! Relation bag keys.
//!
//! These strings are the compatibility contract with the Kafka provider and
//! must never be renamed.

/// SASL username issued by the provider.
pub const USERNAME: &str = "username";

/// SASL password issued by the provider.
pub const PASSWORD: &str = "password";

/// Comma-separated bootstrap endpoints published by the provider.
pub const URIS: &str = "uris";

/// Prefix the provider grants for consumer group ids.
pub const CONSUMER_GROUP_PREFIX: &str = "consumer-group-prefix";

/// TLS flag; only [`TLS_ENABLED`] turns encryption on.
pub const TLS: &str = "tls";

/// Topic requested by the integrator.
pub const TOPIC: &str = "topic";

/// Comma-joined ACL roles requested by the integrator.
pub const EXTRA_USER_ROLES: &str = "extra-user-roles";

/// Peer cache key holding the mirrored `uris` value.
pub const BOOTSTRAP_SERVER: &str = "bootstrap-server";

/// Derived result key, never stored in a bag.
pub const SECURITY_PROTOCOL: &str = "security-protocol";

pub const TLS_ENABLED: &str = "enabled";
