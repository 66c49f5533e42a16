//! Leadership gate.
//!
//! Only the elected leader may write the local application's bags. The gate
//! asks the [`LeadershipOracle`] afresh on every check and hands out a
//! [`Leadership`] proof that store writes require, so a write without a
//! passing check does not type-check.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

/// Source of truth for leadership, owned by the host.
pub trait LeadershipOracle: Send + Sync {
    fn is_leader(&self) -> bool;
}

/// Proof that leadership was confirmed for the current event.
///
/// Only [`LeaderGate::check`] can construct one.
#[derive(Debug)]
pub struct Leadership {
    _private: (),
}

/// Level-triggered leadership guard.
#[derive(Clone)]
pub struct LeaderGate {
    oracle: Arc<dyn LeadershipOracle>,
}

impl LeaderGate {
    pub fn new(oracle: Arc<dyn LeadershipOracle>) -> Self {
        Self { oracle }
    }

    pub fn is_leader(&self) -> bool {
        self.oracle.is_leader()
    }

    /// Query the oracle and mint a proof if this unit leads.
    pub fn check(&self) -> Option<Leadership> {
        if self.oracle.is_leader() {
            Some(Leadership { _private: () })
        } else {
            debug!("leadership check failed");
            None
        }
    }
}

/// Oracle backed by a flag the host flips.
#[derive(Debug, Default)]
pub struct StaticLeadership {
    leader: AtomicBool,
}

impl StaticLeadership {
    pub fn new(leader: bool) -> Self {
        Self {
            leader: AtomicBool::new(leader),
        }
    }

    pub fn set(&self, leader: bool) {
        self.leader.store(leader, Ordering::SeqCst);
    }
}

impl LeadershipOracle for StaticLeadership {
    fn is_leader(&self) -> bool {
        self.leader.load(Ordering::SeqCst)
    }
}
