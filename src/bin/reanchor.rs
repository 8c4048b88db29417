//! Reanchor CLI - pin syntax nodes and relocate them after edits.

use clap::Parser;

mod cli;

use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Pin(args) => {
            let config = cli::load_configuration(cli.config.as_deref())?;
            cli::pin_command(args, config)?;
        }
        Commands::Relocate(args) => {
            let config = cli::load_configuration(cli.config.as_deref())?;
            cli::relocate_command(args, config)?;
        }
        Commands::Landmarks(args) => {
            let config = cli::load_configuration(cli.config.as_deref())?;
            cli::landmarks_command(args, config)?;
        }
        Commands::PrintDefaultConfig => {
            cli::print_default_config()?;
        }
        Commands::ValidateConfig(args) => {
            cli::validate_config(args)?;
        }
        Commands::ListLanguages => {
            cli::list_languages()?;
        }
    }

    Ok(())
}
