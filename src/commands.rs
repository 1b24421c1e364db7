//! CLI command definitions
//!
//! Defines the clap commands for the pipeline runner.

use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Log in, then run a pipeline from a configuration file
    Run {
        /// Pipeline configuration file (.json, .yaml or .yml; default: api.json)
        #[arg(long, short)]
        file: Option<PathBuf>,

        /// Environment to target: development, staging or production
        #[arg(long, short)]
        env: Option<String>,

        /// Which pipeline(s) to run
        #[arg(long, short, value_enum, default_value_t = PipelineMode::Current)]
        pipeline: PipelineMode,

        /// Custom pipeline name (with --pipeline custom)
        #[arg(long, short)]
        name: Option<String>,

        /// File used to persist the token (default: token.txt)
        #[arg(long)]
        token_file: Option<PathBuf>,
    },

    /// Only validate or refresh the persisted token
    Login {
        /// Pipeline configuration file (.json, .yaml or .yml; default: api.json)
        #[arg(long, short)]
        file: Option<PathBuf>,

        /// Environment to target: development, staging or production
        #[arg(long, short)]
        env: Option<String>,

        /// File used to persist the token (default: token.txt)
        #[arg(long)]
        token_file: Option<PathBuf>,
    },

    /// Send a single request without a configuration file
    Inline {
        /// Full URL, e.g. https://api.example.com/v1/users
        #[arg(long)]
        url: String,

        /// HTTP method
        #[arg(long, default_value = "GET")]
        method: String,

        /// Request body; sent as JSON when it parses, otherwise as a string
        #[arg(long)]
        body: Option<String>,

        /// Headers as comma-separated key:value pairs
        #[arg(long)]
        headers: Option<String>,

        /// HTTP or WS
        #[arg(long, default_value = "HTTP")]
        protocol: String,

        /// WebSocket read deadline in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Bearer token to send
        #[arg(long)]
        token: Option<String>,

        /// Expected status code
        #[arg(long = "status-code", default_value_t = 200)]
        status_code: u16,
    },
}

/// Pipeline selection for `run`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PipelineMode {
    /// The current pipeline
    Current,
    /// Every custom pipeline
    All,
    /// One custom pipeline chosen with --name
    Custom,
}
