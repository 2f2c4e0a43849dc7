//! Bazaar CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bazaar_cli::cli::{Cli, Commands};
use bazaar_cli::commands::{AccountCommand, MarketCommand};
use bazaar_cli::output::{Message, OutputFormat};
use bazaar_cli::Sandbox;
use bazaar_market::MarketConfig;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Some(
            MarketConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
        ),
        None => None,
    };
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    if let Commands::Init = cli.command {
        let sandbox = Sandbox::init(&cli.state_dir, &config.unwrap_or_default()).await?;
        let msg = Message::new(format!(
            "Initialised sandbox at {} (custody {})",
            cli.state_dir.display(),
            sandbox.custody_address()
        ));
        format.write(&mut stdout, &msg)?;
        return Ok(());
    }

    let mut sandbox = Sandbox::open(&cli.state_dir, config.as_ref())
        .await
        .with_context(|| format!("opening sandbox {}", cli.state_dir.display()))?;

    match &cli.command {
        Commands::Init => {}
        Commands::Account { command } => {
            AccountCommand::new(&mut sandbox)
                .execute(&mut stdout, &format, command)
                .await?;
        }
        Commands::Asset { command } => {
            AccountCommand::new(&mut sandbox)
                .execute_asset(&mut stdout, &format, command)
                .await?;
        }
        Commands::Market(command) => {
            MarketCommand::new(&sandbox)
                .execute(&mut stdout, &format, command)
                .await?;
        }
    }

    sandbox.save().await.context("saving sandbox")?;
    Ok(())
}
