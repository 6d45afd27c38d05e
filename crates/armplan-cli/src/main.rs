mod cmd;
mod output;

use armplan_core::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "armplan",
    about = "Turn plain-language manipulation tasks into robot arm command sequences",
    version,
    propagate_version = true
)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and demo UI
    Serve {
        /// Port to listen on (0 = OS-assigned)
        #[arg(long, env = "PORT", default_value = "8000")]
        port: u16,

        /// Open a browser once the server is listening
        #[arg(long)]
        open: bool,
    },

    /// Plan a command sequence for a task description
    Analyze {
        description: String,

        /// Seed the planner for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Validate a command sequence JSON file (exits 1 when invalid)
    Validate { file: PathBuf },
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let default_level = match &cli.command {
        Commands::Serve { .. } => config.tracing_level(),
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Serve { port, open } => cmd::serve::run(config, port, open),
        Commands::Analyze { description, seed } => {
            cmd::analyze::run(&config, &description, seed, cli.json)
        }
        Commands::Validate { file } => cmd::validate::run(&config, &file, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
