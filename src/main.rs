//! apee-i - configuration-driven API pipeline runner
//!
//! Logs in once, runs ordered HTTP/WebSocket call sequences against the
//! chosen environment and reports pass/fail per call.

use apee_i::{cli, commands::Commands, common::logging};
use clap::Parser;

#[derive(Parser)]
#[command(name = "apee-i", about = "Run API pipelines described in a JSON or YAML file")]
#[command(version, long_about = None)]
struct Cli {
    /// Print response bodies and debug logs
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init_cli(cli.verbose);

    if let Err(e) = cli::dispatch(cli.command, cli.verbose).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
