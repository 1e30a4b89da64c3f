use log::*;

use std::collections::HashSet;

use actix_web::web;

use uuid::Uuid;

use crate::error::*;
use crate::app::*;
use crate::auth::JwtConfig;
use crate::db::{DbService, StoreConfig};
use crate::realtime::Broadcaster;

mod user;
mod auth;
mod profile;
mod post;
mod client;

type BoxService = Box<dyn Service>;

pub trait Service: ServiceClone + Send {
  /// Load Service config from AppConfig.
  fn load_app_config(&mut self, config: &AppConfig, prefix: &str) -> Result<()>;

  /// Setup Service endpoints.
  fn web_config(&self, _web: &mut web::ServiceConfig) {
  }

  /// Setup Service endpoints under `/api`.
  fn api_config(&self, _web: &mut web::ServiceConfig) {
  }
}

pub trait ServiceClone {
  fn clone_box(&self) -> BoxService;
}

impl<T> ServiceClone for T
where
    T: 'static + Service + Clone,
{
  fn clone_box(&self) -> BoxService {
    Box::new(self.clone())
  }
}

impl Clone for BoxService {
  fn clone(&self) -> BoxService {
    self.clone_box()
  }
}

/// Shared state and the enabled services of one server.
#[derive(Clone)]
pub struct Services {
  store: StoreConfig,
  jwt: JwtConfig,
  broadcaster: Broadcaster,
  services: Vec<BoxService>,
}

impl Services {
  fn load_service(name: &str, config: &AppConfig, prefix: &str) -> Result<BoxService> {
    let mut service: BoxService = match name {
      "User" => Box::new(user::new_factory()),
      "Auth" => Box::new(auth::new_factory()),
      "Profile" => Box::new(profile::new_factory()?),
      "Post" => Box::new(post::new_factory()),
      "Client" => Box::new(client::new_factory()),
      _ => {
        return Err(anyhow::anyhow!("Unknown Service: {}", name).into());
      },
    };

    service.load_app_config(config, prefix)?;
    Ok(service)
  }

  /// Load Service config from AppConfig.
  pub fn load_app_config(config: &AppConfig, prefix: &str) -> Result<Services> {
    // DB config
    let db_url = config.get_str("db.url")?
      .ok_or_else(|| anyhow::anyhow!("db.url must be set"))?;

    let mut services = Services {
      store: StoreConfig::from_url(&db_url),
      jwt: JwtConfig::load_app_config(config)?,
      broadcaster: Broadcaster::load_app_config(config)?,
      services: Vec::new(),
    };

    let mut loaded = HashSet::new();
    let list = config.get_array(&format!("{}.services", prefix))?
      .ok_or_else(|| anyhow::anyhow!("missing list of services: {}.services", prefix))?;
    for name in list.iter() {
      info!("Loading {}Service config", name);
      // check if it is loaded already.
      if !loaded.insert(name.clone()) {
        return Err(anyhow::anyhow!("can't load service multiple times: {}", name).into());
      }
      let service = Self::load_service(name, config, prefix)?;
      services.services.push(service);
    }
    Ok(services)
  }

  /// Setup Service endpoints.
  pub fn web_config(&self, web: &mut web::ServiceConfig) {
    // DbService for this worker.
    let db = DbService::new(&self.store);
    web
      .app_data(web::Data::new(db))
      .app_data(web::Data::new(self.jwt.clone()))
      .app_data(web::Data::new(self.broadcaster.clone()))
      .app_data(json_config());

    web.service(
      web::scope("/api")
        .configure(|web| {
          for service in self.services.iter() {
            service.api_config(web);
          }
        })
    );
    // after `/api`, the client may mount a catch-all.
    for service in self.services.iter() {
      service.web_config(web);
    }
  }
}

pub fn config_services(config: &AppConfig, prefix: &str) -> Result<Services> {
  Services::load_app_config(config, prefix)
}

fn json_config() -> web::JsonConfig {
  web::JsonConfig::default()
    .limit(256 * 1024)
    .error_handler(|err, _req| {
      debug!("Rejected JSON body: {}", err);
      Error::bad_request(&err.to_string()).into()
    })
}

/// Malformed ids can't match any document, so they are reported as not found.
pub(crate) fn parse_id(id: &str, not_found: &str) -> Result<Uuid> {
  Uuid::parse_str(id).map_err(|_| Error::not_found(not_found))
}
