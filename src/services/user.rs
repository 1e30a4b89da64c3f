use log::*;

use actix_web::{post, web, HttpResponse};

use crate::error::*;
use crate::app::*;
use crate::forms::*;
use crate::models::User;

use crate::db::DbService;
use crate::auth::{pass, GenerateJwt, JwtConfig};

/// register new user
#[post("/users")]
async fn register(
  cfg: web::Data<UserService>,
  db: web::Data<DbService>,
  keys: web::Data<JwtConfig>,
  register: web::Json<RegisterUser>,
) -> Result<HttpResponse> {
  if !cfg.allow_register {
    return Ok(HttpResponse::Forbidden().json(json!({
      "msg": "Registration is disabled",
    })));
  }
  register.validate()?;

  let name = present(&register.name).unwrap_or_default();
  let email = present(&register.email).unwrap_or_default();
  let password = register.password.as_deref().unwrap_or_default();

  if db.find_user_by_email(email).await?.is_some() {
    return Err(Error::rejected("User already exists"));
  }

  let user = User::new(name, email, pass::hash_password(password)?);
  db.register_user(&user).await?;
  info!("registered user {}", user.id);

  Ok(HttpResponse::Created().json(TokenResponse {
    token: user.generate_jwt(&keys)?,
  }))
}

#[derive(Debug, Clone)]
pub struct UserService {
  pub allow_register: bool,
}

impl super::Service for UserService {
  fn load_app_config(&mut self, config: &AppConfig, _prefix: &str) -> Result<()> {
    self.allow_register = config.get_bool("user.allow_register")?.unwrap_or(true);
    Ok(())
  }

  fn api_config(&self, web: &mut web::ServiceConfig) {
    web
      .app_data(web::Data::new(self.clone()))
      .service(register);
  }
}

pub fn new_factory() -> UserService {
  UserService {
    allow_register: true,
  }
}
