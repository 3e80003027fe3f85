// sentinel/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug sentinel run ... for details. Logs go to stderr so
    // that `--format json` keeps stdout machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            project_dir,
            entity,
            format,
            dry_run,
        } => {
            let success = commands::run::execute(project_dir, entity, format, dry_run).await?;
            if !success {
                // Exit with error code for CI/CD
                std::process::exit(1);
            }
        }
        Commands::Rules { project_dir } => commands::rules::execute(project_dir)?,
        Commands::Inspect {
            db_path,
            table,
            limit,
        } => commands::inspect::execute(db_path, table, limit)?,
    }

    Ok(())
}
