mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
  // RUST_LOG overrides the default filter.
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rzmq_lifecycle=info,warn"));
  let subscriber = FmtSubscriber::builder()
    .with_env_filter(env_filter)
    .with_target(true)
    .finish();
  tracing::subscriber::set_global_default(subscriber)?;

  let cli_args = Cli::parse();

  match cli_args.command {
    Commands::Smoke(smoke_args) => commands::smoke::run(smoke_args),
    Commands::Patterns => commands::patterns::list(),
  }
}
