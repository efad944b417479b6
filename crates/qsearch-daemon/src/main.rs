//! Queued search CLI
//!
//! Drains the search change queue and applies the result to the index.
//!
//! # Usage
//!
//! ```bash
//! qsearch process [--json]
//! qsearch enqueue <update|delete> <identifier>
//! qsearch put <identifier> --field key=value ...
//! qsearch delete <identifier>
//! qsearch status
//! qsearch search <query> [--type TYPE] [--limit N]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/qsearch/config.toml)
//! 3. Environment variables (QSEARCH_*)
//! 4. CLI flags

use anyhow::Result;

use qsearch_daemon::{
    delete_entity, enqueue_message, handle_process, handle_search, init_logging, load_settings,
    put_entity, show_status, Cli, Commands,
};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let settings = load_settings(
        cli.config.as_deref(),
        cli.db_path.as_deref(),
        cli.log_level.as_deref(),
    )?;
    init_logging(&settings)?;

    match cli.command {
        Commands::Process { json } => {
            handle_process(&settings, json)?;
        }
        Commands::Enqueue { action, identifier } => {
            let sequence = enqueue_message(&settings, action, &identifier)?;
            println!("Enqueued {} (sequence {})", identifier, sequence);
        }
        Commands::Put { identifier, fields } => {
            let entity = put_entity(&settings, &identifier, &fields)?;
            println!("Stored {} ({} fields)", entity.identifier(), entity.fields.len());
        }
        Commands::Delete { identifier } => {
            if !delete_entity(&settings, &identifier)? {
                println!("{} was not stored, removal queued anyway", identifier);
            } else {
                println!("Deleted {}", identifier);
            }
        }
        Commands::Status { limit } => {
            show_status(&settings, limit)?;
        }
        Commands::Search {
            query,
            entity_type,
            limit,
        } => {
            handle_search(&settings, &query, entity_type.as_deref(), limit)?;
        }
    }

    Ok(())
}
