mod cli;
mod commands;
mod terminal;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use commands::App;
use std::process::ExitCode;
use terminal::TerminalHost;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("issue_sidebar=warn"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if commands::already_reported(&e) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let assume_yes = matches!(cli.command, Commands::Close { yes: true, .. });
    let app = App::new(&cli, TerminalHost::new(assume_yes))?;

    match cli.command {
        Commands::SetToken => {
            commands::set_token(&app)?;
        }

        Commands::SelectRepo { owner } => {
            commands::select_repo(&app, owner.as_deref()).await?;
        }

        Commands::Refresh => {
            commands::refresh(&app).await?;
        }

        Commands::Watch { interval } => {
            commands::watch(&app, interval).await?;
        }

        Commands::Diagnose => {
            commands::diagnose(&app).await?;
        }

        Commands::Close { number, owner, repo, .. } => {
            commands::close(&app, number, owner, repo).await?;
        }

        Commands::Comment { number, body, owner, repo } => {
            commands::comment(&app, number, body, owner, repo).await?;
        }
    }

    Ok(())
}
