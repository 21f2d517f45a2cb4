//! Command-line entry point for the job architecture store.
//!
//! # Responsibility
//! - Resolve configuration from flags and `JOBARCH_*` environment variables.
//! - Route one command into `JobArchitectureService` and print JSON results.

use clap::{Parser, Subcommand};
use jobarch_core::db::open_db;
use jobarch_core::{
    core_version, default_log_level, init_logging, JobArchitectureItemCreate,
    JobArchitectureItemId, JobArchitectureService, Layer, SqliteJobArchitectureRepository, UserId,
};
use log::info;
use serde_json::{json, Value};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "jobarch", version, about = "Manage a job architecture hierarchy")]
struct Cli {
    /// SQLite database file; created and migrated on first use.
    #[arg(long, env = "JOBARCH_DB", default_value = "jobarch.sqlite3", global = true)]
    db: PathBuf,

    /// Log level (trace|debug|info|warn|error).
    #[arg(long, env = "JOBARCH_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "JOBARCH_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List all roots.
    Roots,
    /// List direct children of an item.
    Children { parent: JobArchitectureItemId },
    /// Show items by id; unknown ids are skipped.
    Show {
        #[arg(required = true)]
        ids: Vec<JobArchitectureItemId>,
    },
    /// Show the root of an item's tree.
    Root { id: JobArchitectureItemId },
    /// Create an item and print its id.
    Create {
        #[arg(long)]
        parent: Option<JobArchitectureItemId>,
        #[arg(long)]
        layer: Layer,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        creator: Option<UserId>,
    },
    /// Replace an item's title and description.
    Update {
        id: JobArchitectureItemId,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete items of one layer, including their subtrees.
    Delete {
        #[arg(long)]
        layer: Layer,
        #[arg(required = true)]
        ids: Vec<JobArchitectureItemId>,
    },
    /// Print the core version.
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    let output = match cli.command {
        Command::Version => json!({ "version": core_version() }),
        command => run_store_command(&cli.db, command)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_store_command(db: &Path, command: Command) -> Result<Value, Box<dyn Error>> {
    let conn = open_db(db)?;
    let service = JobArchitectureService::new(SqliteJobArchitectureRepository::try_new(&conn)?);

    let output = match command {
        Command::Roots => serde_json::to_value(service.get_roots()?)?,
        Command::Children { parent } => serde_json::to_value(service.get_children(parent)?)?,
        Command::Show { ids } => serde_json::to_value(service.get_many(&ids)?)?,
        Command::Root { id } => serde_json::to_value(service.get_root(id)?)?,
        Command::Create {
            parent,
            layer,
            title,
            description,
            creator,
        } => {
            let request = JobArchitectureItemCreate {
                layer,
                title,
                description,
                creator,
            };
            let id = service.create(parent, &request)?;
            info!("event=cli_create module=cli status=ok layer={layer}");
            json!({ "id": id })
        }
        Command::Update {
            id,
            title,
            description,
        } => {
            service.update(id, &title, description.as_deref())?;
            serde_json::to_value(service.get_one(id)?)?
        }
        Command::Delete { layer, ids } => {
            let removed = service.delete_many(&ids, layer)?;
            json!({ "removed": removed })
        }
        Command::Version => json!({ "version": core_version() }),
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::{CommandFactory, Parser};
    use jobarch_core::Layer;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn create_parses_layer_and_parent() {
        let cli = Cli::try_parse_from([
            "jobarch",
            "--db",
            "/tmp/test.sqlite3",
            "create",
            "--parent",
            "eb184430-ab14-434e-a459-faf7ad919429",
            "--layer",
            "family",
            "--title",
            "Engineering",
        ])
        .unwrap();

        match cli.command {
            Command::Create {
                parent,
                layer,
                title,
                ..
            } => {
                assert_eq!(
                    parent.map(|id| id.to_string()).as_deref(),
                    Some("eb184430-ab14-434e-a459-faf7ad919429")
                );
                assert_eq!(layer, Layer::Family);
                assert_eq!(title, "Engineering");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn delete_rejects_unknown_layer() {
        let result = Cli::try_parse_from([
            "jobarch",
            "delete",
            "--layer",
            "team",
            "eb184430-ab14-434e-a459-faf7ad919429",
        ]);
        assert!(result.is_err());
    }
}
