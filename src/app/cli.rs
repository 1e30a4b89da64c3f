use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "devconnector", version, about = "DevConnector API server")]
pub struct Cli {
  /// Config file to load instead of conf/$RUN_MODE
  #[arg(short, long, value_name = "FILE")]
  pub config: Option<String>,

  #[command(subcommand)]
  pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Subcommand)]
pub enum Command {
  /// Run the API servers (default)
  Serve,
  /// Create the PostgreSQL tables
  Migrate,
}
