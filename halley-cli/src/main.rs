mod commands;
mod errors;
mod ops;
mod prompt;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::Commands;
use crate::errors::Result;
use halley_core::context::OpsContext;

/// Halley - operations tool for a containerized sequencer node
#[derive(Parser, Debug)]
#[command(name = "halley")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the node's config store and manifest
    #[arg(short = 'd', long = "dir", global = true)]
    pub dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let base_dir = cli.dir.unwrap_or_else(OpsContext::default_base_dir);
    let mut ctx = OpsContext::new(base_dir);

    match cli.command {
        Commands::Install {
            tag,
            network,
            schema,
            snapshot_url,
            no_verify,
        } => {
            if let Some(tag) = tag {
                ctx.tag = tag;
            }
            if let Some(network) = network {
                ctx.network = network;
            }
            let schema = ops::parse_schema_flag(schema.as_deref())?;
            ops::install(&ctx, schema, snapshot_url, no_verify).await
        }

        Commands::Configure {
            set,
            schema,
            no_verify,
        } => {
            let schema = ops::parse_schema_flag(schema.as_deref())?;
            ops::configure(&ctx, set, schema, no_verify).await
        }

        Commands::Update { tag, no_verify } => {
            if let Some(tag) = tag {
                ctx.tag = tag;
            }
            ops::update(&ctx, no_verify).await
        }

        Commands::Remove { purge, force } => ops::remove(&ctx, purge, force).await,

        Commands::Status => ops::status(&ctx).await,

        Commands::Logs { follow, tail } => ops::logs(&ctx, follow, tail).await,
    }
}
