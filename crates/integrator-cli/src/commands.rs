//! Hook runner subcommands

use clap::{ArgAction, Subcommand};
use colored::*;
use integrator_core::{EventOutcome, LeadershipOracle, RelationStore};
use integrator_types::{ActionName, Event, Participant, RelationEvent, RelationId};
use serde::Serialize;
use tabled::Tabled;
use tracing::info;

use crate::error::{CliError, CliResult};
use crate::output::{self, print_success, OutputFormat};
use crate::state::Unit;

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Establish a relation and emit relation-created
    Relate {
        /// Endpoint name (e.g. kafka-client, cluster)
        #[arg(long)]
        name: String,

        /// Remote application on the other side
        #[arg(long)]
        app: Option<String>,
    },

    /// Tear a relation down
    Unrelate {
        #[arg(long)]
        relation: u32,
    },

    /// Write into the remote application's bag and emit relation-changed
    SetRemote {
        #[arg(long)]
        relation: u32,

        /// Entries as key=value
        #[arg(required = true, value_parser = parse_key_value)]
        entries: Vec<(String, String)>,
    },

    /// Set leadership; gaining it emits leader-elected
    Leader {
        #[arg(action = ArgAction::Set)]
        elected: bool,
    },

    /// Invoke an operator action
    RunAction {
        /// get-topic, get-bootstrap-server, get-username, get-password, get-data
        name: ActionName,
    },

    /// Redeliver deferred events
    Redeliver,

    /// Show unit state
    Status,
}

/// Parse a `key=value` pair
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{}`", raw))?;
    if key.is_empty() {
        return Err(format!("empty key in `{}`", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Execute a command against a live unit
pub fn execute(command: Commands, unit: &mut Unit, format: OutputFormat) -> CliResult<()> {
    match command {
        Commands::Relate { name, app } => {
            let id = unit.store.add_relation(&name, app.as_deref());
            info!(relation = %id, endpoint = %name, "relation created");
            let outcome = unit.process(Event::RelationCreated(RelationEvent::new(id, name, app)))?;
            output::print_outcome(&outcome, format)
        }

        Commands::Unrelate { relation } => {
            let id = RelationId(relation);
            if !unit.store.remove_relation(id) {
                return Err(CliError::UnknownRelation(id));
            }
            print_success(&format!("relation {} removed", id));
            Ok(())
        }

        Commands::SetRemote { relation, entries } => {
            let id = RelationId(relation);
            let target = unit
                .store
                .relation_by_id(id)
                .ok_or(CliError::UnknownRelation(id))?;
            for (key, value) in &entries {
                unit.store.set_remote(id, key, value)?;
            }
            let event = Event::RelationChanged(RelationEvent::new(
                id,
                target.name,
                target.remote_app,
            ));
            let outcome = unit.process(event)?;
            output::print_outcome(&outcome, format)
        }

        Commands::Leader { elected } => {
            unit.leadership.set(elected);
            if !elected {
                print_success("leadership released");
                return Ok(());
            }
            let outcome = unit.process(Event::LeaderElected)?;
            output::print_outcome(&outcome, format)
        }

        Commands::RunAction { name } => {
            let outcome = unit.process(Event::Action { name })?;
            output::print_outcome(&outcome, format)?;
            match outcome {
                EventOutcome::Action { record, .. } => match record.failure {
                    Some(message) => Err(CliError::ActionFailed {
                        action: name.to_string(),
                        message,
                    }),
                    None => Ok(()),
                },
                _ => Ok(()),
            }
        }

        Commands::Redeliver => {
            let before = unit.deferred.len();
            let outcomes = unit.redeliver()?;
            let summary = format!(
                "redelivered {} event(s), {} still deferred",
                before,
                unit.deferred.len()
            );
            output::print_outcomes(&outcomes, &summary, format)
        }

        Commands::Status => print_status(unit, format),
    }
}

/// One row of the relation table
#[derive(Debug, Serialize, Tabled)]
pub struct RelationRow {
    pub id: u32,
    pub endpoint: String,
    #[tabled(display_with = "display_app")]
    pub remote_app: Option<String>,
    pub local_keys: usize,
    pub remote_keys: usize,
}

fn display_app(app: &Option<String>) -> String {
    app.clone().unwrap_or_else(|| "-".to_string())
}

#[derive(Debug, Serialize)]
struct StatusView {
    leader: bool,
    status: String,
    sync_state: String,
    deferred: usize,
    relations: Vec<RelationRow>,
}

pub fn relation_rows(unit: &Unit) -> Vec<RelationRow> {
    unit.store
        .snapshot()
        .relations
        .into_iter()
        .map(|record| RelationRow {
            id: record.relation.id.0,
            endpoint: record.relation.name,
            remote_app: record.relation.remote_app,
            local_keys: record.local.len(),
            remote_keys: record.remote.len(),
        })
        .collect()
}

fn print_status(unit: &Unit, format: OutputFormat) -> CliResult<()> {
    let view = StatusView {
        leader: unit.leadership.is_leader(),
        status: unit.status.current().to_string(),
        sync_state: unit.sync_state().to_string(),
        deferred: unit.deferred.len(),
        relations: relation_rows(unit),
    };
    if let Some(text) = output::render(&view, format)? {
        println!("{}", text);
        return Ok(());
    }

    let leader = if view.leader { "yes".green() } else { "no".dimmed() };
    println!("Leader:     {}", leader);
    println!("Status:     {}", view.status);
    println!("Sync state: {}", view.sync_state.bold());
    println!("Deferred:   {}", view.deferred);
    for event in unit.deferred.iter() {
        println!("  {} {}", "-".dimmed(), event.kind());
    }
    println!();
    output::print_rows(view.relations, OutputFormat::Table)?;

    if let Some(peer) = unit.store.relation(&unit.config.peer_relation) {
        if let Some(cache) = unit.store.bag(peer.id, &Participant::LocalApp) {
            if !cache.is_empty() {
                println!("\nPeer cache:");
                for (key, value) in cache.iter() {
                    println!("  {}: {}", key.bold(), value);
                }
            }
        }
    }
    Ok(())
}
