use log::*;

use actix_rt::System;

use crate::{
  error::*,
  app::*,
  db::{DbService, StoreConfig},
};

pub fn execute(config: AppConfig) -> Result<()> {
  let db_url = config.get_str("db.url")?
    .ok_or_else(|| anyhow::anyhow!("db.url must be set"))?;
  let store = StoreConfig::from_url(&db_url);
  if let StoreConfig::Memory(_) = store {
    info!("Memory store needs no migration.");
    return Ok(());
  }

  System::new().block_on(async move {
    let db = DbService::new(&store);
    db.migrate().await
  })
}
