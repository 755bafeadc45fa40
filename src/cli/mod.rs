//! CLI argument definitions for ecfg.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ecfg - inspect and maintain hierarchical configuration keys.
///
/// Bootstrap settings come from ETCD_ADDRESS, ETCD_PATH, ETCD_DELETE_UNUSED
/// and ETCD_SESSION_TIMEOUT; the flags below override them.
#[derive(Parser, Debug)]
#[command(name = "ecfg")]
#[command(author, version = crate::VERSION, about = "Inspect and maintain hierarchical configuration keys", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Comma-separated etcd endpoints (overrides ETCD_ADDRESS)
    #[arg(long, global = true, value_name = "LIST")]
    pub endpoints: Option<String>,

    /// Root path of the configuration tree (overrides ETCD_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub root: Option<String>,

    /// Per-operation timeout, e.g. 5s or 500ms (overrides ETCD_SESSION_TIMEOUT)
    #[arg(long, global = true, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Set delete-unused in the resolved settings (overrides ETCD_DELETE_UNUSED)
    #[arg(long, global = true)]
    pub delete_unused: bool,

    /// Use a local JSON file as the store instead of etcd
    #[arg(long, global = true, value_name = "FILE", env = "ECFG_STORE_FILE")]
    pub store_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show resolved bootstrap settings and where each came from
    Env,

    /// List every key under a prefix with its depth and leaf name
    Scan {
        /// Key prefix (defaults to the root path)
        prefix: Option<String>,
    },

    /// Show the winning (deepest) key for each leaf name under a prefix
    Resolve {
        /// Key prefix (defaults to the root path)
        prefix: Option<String>,
    },

    /// Write a single key
    Put {
        /// Full key, e.g. /app/eu/Timeout
        key: String,
        /// Raw value
        value: String,
    },

    /// Delete a single key
    Delete {
        /// Full key
        key: String,
    },

    /// Delete keys whose leaf is not one of the kept names
    Prune {
        /// Key prefix (defaults to the root path)
        prefix: Option<String>,

        /// Declared field name to keep (repeatable)
        #[arg(long = "keep", short = 'k', value_name = "NAME", required = true)]
        keep: Vec<String>,

        /// Report what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
    },
}
