//! # Integrator CLI - file-backed hook runner
//!
//! Drives the credential protocol from the command line. Each invocation
//! loads the unit's state file, turns the subcommand into a host event,
//! redelivers anything still deferred, dispatches the event and writes the
//! state back.

pub mod commands;
pub mod error;
pub mod output;
pub mod state;

pub use commands::{execute, Commands};
pub use error::{CliError, CliResult};
pub use output::OutputFormat;
pub use state::{Unit, UnitState};
