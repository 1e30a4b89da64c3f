use serde::de::Deserialize;

use config::{Config, ConfigError, Environment, File, FileFormat};

use crate::app::Cli;
use crate::error::*;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub conf: Config
}

impl AppConfig {
  pub fn new_cli(cli: &Cli) -> Result<Self> {
    // Load defaults
    let mut builder = Config::builder()
      .add_source(File::with_name("conf/default"));

    if let Some(ref config_file) = cli.config {
      builder = builder.add_source(File::with_name(config_file));
    } else {
      // Get RUN_MODE from environment
      let env = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
      builder = builder.add_source(File::with_name(&format!("conf/{}", env)).required(false));
    }

    // Allow overrides from environment, e.g. APP__DB__URL
    let conf = builder
      .add_source(Environment::with_prefix("APP").prefix_separator("__").separator("__"))
      .build()?;

    Ok(AppConfig {
      conf,
    })
  }

  /// Config from a TOML document, without files or environment.
  pub fn from_toml(toml: &str) -> Result<Self> {
    let conf = Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()?;
    Ok(AppConfig {
      conf,
    })
  }

  pub fn get<'de, T: Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
    Ok(self.conf.get(key).map(Some).or_else(|e| {
      match e {
        ConfigError::NotFound(_) => Ok(None),
        err => Err(err),
      }
    })?)
  }

  pub fn get_str(&self, key: &str) -> Result<Option<String>> {
    self.get::<String>(key)
  }

  /// Config value, or the given environment variable as a fallback.
  pub fn get_str_or_env(&self, key: &str, var: &str) -> Result<Option<String>> {
    match self.get_str(key)? {
      Some(val) => Ok(Some(val)),
      None => Ok(dotenv::var(var).ok()),
    }
  }

  pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
    self.get::<i64>(key)
  }

  pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
    self.get::<bool>(key)
  }

  pub fn get_array(&self, key: &str) -> Result<Option<Vec<String>>> {
    self.get::<Vec<String>>(key)
  }
}
