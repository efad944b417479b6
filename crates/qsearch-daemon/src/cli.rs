//! CLI argument parsing for the qsearch binary.
//!
//! CLI flags override all other config sources.

use clap::{Parser, Subcommand, ValueEnum};

use qsearch_types::Identifier;

/// Queued search
///
/// Keeps a full-text index in step with the entity store by draining
/// its change queue.
#[derive(Parser, Debug)]
#[command(name = "qsearch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/qsearch/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override database path
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Queued search commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drain the queue once and flush it to the index
    Process {
        /// Print the cycle report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Push a raw change message onto the queue
    Enqueue {
        /// Change action
        #[arg(value_enum)]
        action: ActionArg,

        /// Entity identifier (<type>.<primary key>)
        identifier: Identifier,
    },

    /// Store an entity and queue it for indexing
    Put {
        /// Entity identifier (<type>.<primary key>)
        identifier: Identifier,

        /// Field assignment, repeatable
        #[arg(short, long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },

    /// Delete an entity and queue its removal from the index
    Delete {
        /// Entity identifier (<type>.<primary key>)
        identifier: Identifier,
    },

    /// Show queue length and pending messages
    Status {
        /// Number of pending messages to list
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Search the index
    Search {
        /// Query string
        query: String,

        /// Restrict results to one entity type
        #[arg(short = 't', long = "type")]
        entity_type: Option<String>,

        /// Maximum results
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
}

/// Actions accepted by `enqueue`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionArg {
    Update,
    Delete,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_process() {
        let cli = Cli::parse_from(["qsearch", "process"]);
        assert!(matches!(cli.command, Commands::Process { json: false }));
    }

    #[test]
    fn test_cli_process_json() {
        let cli = Cli::parse_from(["qsearch", "process", "--json"]);
        assert!(matches!(cli.command, Commands::Process { json: true }));
    }

    #[test]
    fn test_cli_with_config() {
        let cli = Cli::parse_from(["qsearch", "--config", "/path/to/config.toml", "process"]);
        assert_eq!(cli.config, Some("/path/to/config.toml".to_string()));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["qsearch", "status", "--db-path", "/custom/db", "-l", "debug"]);
        assert_eq!(cli.db_path, Some("/custom/db".to_string()));
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_enqueue() {
        let cli = Cli::parse_from(["qsearch", "enqueue", "delete", "blog.post.7"]);
        match cli.command {
            Commands::Enqueue { action, identifier } => {
                assert_eq!(action, ActionArg::Delete);
                assert_eq!(identifier.encode(), "blog.post.7");
            }
            _ => panic!("Expected Enqueue command"),
        }
    }

    #[test]
    fn test_cli_enqueue_rejects_unknown_action() {
        let result = Cli::try_parse_from(["qsearch", "enqueue", "upsert", "a.1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_malformed_identifier() {
        assert!(Cli::try_parse_from(["qsearch", "enqueue", "update", "nodot"]).is_err());
        assert!(Cli::try_parse_from(["qsearch", "delete", "a."]).is_err());
        assert!(Cli::try_parse_from(["qsearch", "put", ".1"]).is_err());
    }

    #[test]
    fn test_cli_put_fields() {
        let cli = Cli::parse_from([
            "qsearch",
            "put",
            "blog.post.1",
            "--field",
            "title=Hello",
            "-f",
            "views=3",
        ]);
        match cli.command {
            Commands::Put { identifier, fields } => {
                assert_eq!(identifier.entity_type(), "blog.post");
                assert_eq!(identifier.primary_key(), "1");
                assert_eq!(fields, vec!["title=Hello", "views=3"]);
            }
            _ => panic!("Expected Put command"),
        }
    }

    #[test]
    fn test_cli_status_default_limit() {
        let cli = Cli::parse_from(["qsearch", "status"]);
        assert!(matches!(cli.command, Commands::Status { limit: 10 }));
    }

    #[test]
    fn test_cli_search() {
        let cli = Cli::parse_from(["qsearch", "search", "rust", "--type", "blog.post", "-n", "5"]);
        match cli.command {
            Commands::Search {
                query,
                entity_type,
                limit,
            } => {
                assert_eq!(query, "rust");
                assert_eq!(entity_type, Some("blog.post".to_string()));
                assert_eq!(limit, 5);
            }
            _ => panic!("Expected Search command"),
        }
    }
}
