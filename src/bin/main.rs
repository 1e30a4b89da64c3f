use clap::Parser;
use dotenv::dotenv;

use devconnector::{app::*, error::*};

fn main() -> Result<()> {
  dotenv().ok();
  env_logger::init();

  let cli = Cli::parse();

  let config = AppConfig::new_cli(&cli)?;

  match cli.command {
    Some(Command::Migrate) => migrate::execute(config)?,
    // default to 'serve' command.
    Some(Command::Serve) | None => serve::execute(config)?,
  }
  log::info!("Main finished");
  Ok(())
}
