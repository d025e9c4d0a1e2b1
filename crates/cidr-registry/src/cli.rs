//! Command-line interface definition

use clap::{Parser, Subcommand};

/// CIDR Registry - name-to-block allocation service
#[derive(Parser)]
#[command(name = "cidr-registry")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format for record commands
    #[arg(short, long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    /// Record store backend, overriding REGISTRY_STORE
    #[arg(long, global = true)]
    pub store: Option<StoreBackend>,

    /// Deadline for each store call in milliseconds, overriding REGISTRY_OPERATION_TIMEOUT_MS
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server (default)
    Serve {
        /// Port to listen on, overriding PORT
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List all records sorted by key
    List,

    /// Print the next free block in the pool
    Next,

    /// Register a block under a key
    Register {
        /// Record key
        key: String,
        /// Network block, e.g. 10.4.0.0/16
        cidr: String,
    },

    /// Release the block held by a key
    Delete {
        /// Record key
        key: String,
    },
}
