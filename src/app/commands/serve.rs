use log::*;

use actix_rt::System;
use actix_web::{middleware, App, HttpServer};
use actix_cors::Cors;

use crate::{
  error::*,
  app::*,
  db::{DbService, StoreConfig},
  services::config_services,
};

const SERVER_PREFIX: &str = "api";

pub fn execute(config: AppConfig) -> Result<()> {
  let sys = System::new();
  sys.block_on(run_server(config, SERVER_PREFIX))?;
  info!("{}: server stopped.", SERVER_PREFIX);
  Ok(())
}

async fn test_db(url: &str) -> Result<()> {
  let db = DbService::new(&StoreConfig::from_url(url));
  db.prepare().await
}

async fn run_server(config: AppConfig, prefix: &str) -> Result<()> {
  let debug = config.get_bool("debug")?.unwrap_or(false);
  debug!("Debug = {:?}", debug);

  if debug {
    let db_url = config.get_str("db.url")?
      .ok_or_else(|| anyhow::anyhow!("db.url must be set"))?;

    // Test db prepared statements.
    test_db(&db_url).await?;
  }

  // configure services
  info!("Serve.Services: configure services. prefix={}", prefix);
  let services = config_services(&config, prefix)?;

  // Start http server
  let mut server = HttpServer::new(move || {
    let services = services.clone();
    App::new()
      .wrap(middleware::Compress::default())
      .wrap(middleware::Logger::default())
      .wrap(Cors::permissive())
      .configure(move |web| services.web_config(web))
  });

  // workers
  if let Some(workers) = worker_count(&config, prefix)? {
    info!("Workers: {}", workers);
    server = server.workers(workers);
  }

  // listen backlog
  if let Some(backlog) = listen_backlog(&config, prefix)? {
    info!("Listen backlog: {}", backlog);
    server = server.backlog(backlog);
  }

  // setup binds.
  let listen = config.get_str(&format!("{}.listen", prefix))?
    .ok_or_else(|| anyhow::anyhow!("Missing {}.listen", prefix))?;
  info!("{} services listening on: {}", prefix, listen);
  server = server.bind(listen)?;

  // run server future; stops on SIGINT/SIGTERM.
  server.run().await?;
  Ok(())
}

fn worker_count(config: &AppConfig, prefix: &str) -> Result<Option<usize>> {
  match config.get_int(&format!("{}.workers", prefix))? {
    Some(workers) => {
      let workers = usize::try_from(workers).ok()
        .filter(|workers| *workers > 0)
        .ok_or_else(|| anyhow::anyhow!("{}.workers must be > 0", prefix))?;
      Ok(Some(workers))
    },
    None => Ok(None),
  }
}

fn listen_backlog(config: &AppConfig, prefix: &str) -> Result<Option<u32>> {
  match config.get_int(&format!("{}.backlog", prefix))? {
    Some(backlog) => {
      let backlog = u32::try_from(backlog)
        .map_err(|_| anyhow::anyhow!("{}.backlog must be between 0 and {}", prefix, u32::MAX))?;
      Ok(Some(backlog))
    },
    None => Ok(None),
  }
}
