//! qsearch library exports.
//!
//! This crate provides the `qsearch` binary, the command-line wrapper
//! an external scheduler invokes to run one drain cycle at a time.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (process, enqueue, put, delete, status, search)

pub mod cli;
pub mod commands;

pub use cli::{ActionArg, Cli, Commands};
pub use commands::{
    delete_entity, enqueue_message, handle_process, handle_search, init_logging, load_settings,
    process_queue, put_entity, search_index, show_status,
};
