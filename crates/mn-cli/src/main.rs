use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mn_cli::commands::{handle, init, options, probe, watch};
use mn_cli::{Cli, Commands, Config, ConfigAction};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr; stdout carries decisions and listings
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Init) => init::run(&mut out, &config)?,
        Some(Commands::Config(action)) => match action {
            ConfigAction::List => options::list(&mut out, &config)?,
            ConfigAction::Get { name } => options::get(&mut out, &config, name)?,
            ConfigAction::Set { name, value } => options::set(&config, name, value)?,
        },
        Some(Commands::Handle(args)) => handle::run(&mut out, args, &config)?,
        Some(Commands::Watch { host_pid }) => {
            watch::run(&mut out, &config, *host_pid)?;
        }
        Some(Commands::Probe { host_pid }) => probe::run(&mut out, &config, *host_pid)?,
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
