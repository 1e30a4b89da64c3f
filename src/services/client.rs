use log::*;

use std::path::PathBuf;

use actix_files::{Files, NamedFile};
use actix_web::dev::{fn_service, ServiceRequest, ServiceResponse};
use actix_web::web;

use crate::error::*;
use crate::app::*;

/// Serves the built single page app.  Unknown paths get `index.html`.
#[derive(Debug, Clone, Default)]
pub struct ClientService {
  build_dir: Option<PathBuf>,
}

impl super::Service for ClientService {
  fn load_app_config(&mut self, config: &AppConfig, _prefix: &str) -> Result<()> {
    self.build_dir = config.get_str("client.build_dir")?.map(PathBuf::from);
    match self.build_dir {
      Some(ref dir) if !dir.join("index.html").is_file() => {
        warn!("client.build_dir {:?} has no index.html", dir);
      },
      Some(ref dir) => info!("Serving client from {:?}", dir),
      None => info!("client.build_dir not set, not serving the client."),
    }
    Ok(())
  }

  fn web_config(&self, web: &mut web::ServiceConfig) {
    let dir = match self.build_dir {
      Some(ref dir) => dir.clone(),
      None => return,
    };
    let index = dir.join("index.html");
    web.service(
      Files::new("/", dir)
        .index_file("index.html")
        .default_handler(fn_service(move |req: ServiceRequest| {
          let index = index.clone();
          async move {
            let (req, _) = req.into_parts();
            let file = NamedFile::open_async(index).await?;
            let res = file.into_response(&req);
            Ok(ServiceResponse::new(req, res))
          }
        }))
    );
  }
}

pub fn new_factory() -> ClientService {
  Default::default()
}
