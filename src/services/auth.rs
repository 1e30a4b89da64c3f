use log::*;

use actix_web::{get, post, web, HttpResponse};

use crate::error::*;
use crate::app::*;
use crate::forms::*;
use crate::auth::{pass, pass::PasswordCheck, AuthData, GenerateJwt, JwtConfig};

use crate::db::DbService;

use crate::middleware::Auth;

/// login user
#[post("/auth")]
async fn login(
  db: web::Data<DbService>,
  keys: web::Data<JwtConfig>,
  login: web::Json<LoginUser>,
) -> Result<HttpResponse> {
  login.validate()?;
  let email = present(&login.email).unwrap_or_default();
  let password = login.password.as_deref().unwrap_or_default();

  // Get user from database
  let user = match db.find_user_by_email(email).await? {
    Some(user) => user,
    None => return Err(Error::rejected("Invalid credentials")),
  };

  match pass::check_password(&user.password, password)? {
    PasswordCheck::Invalid => return Err(Error::rejected("Invalid credentials")),
    PasswordCheck::NeedsRehash => {
      debug!("rehashing password of user {}", user.id);
      db.update_password(user.id, &pass::hash_password(password)?).await?;
    },
    PasswordCheck::Valid => (),
  }

  Ok(HttpResponse::Ok().json(TokenResponse {
    token: user.generate_jwt(&keys)?,
  }))
}

/// get current user
#[get("/auth", wrap = "Auth")]
async fn current_user(
  auth: AuthData,
  db: web::Data<DbService>,
) -> Result<HttpResponse> {
  match db.find_user_by_id(auth.user_id).await? {
    Some(user) => Ok(HttpResponse::Ok().json(user)),
    None => Err(Error::not_found("User not found")),
  }
}

#[derive(Debug, Clone, Default)]
pub struct AuthService {
}

impl super::Service for AuthService {
  fn load_app_config(&mut self, _config: &AppConfig, _prefix: &str) -> Result<()> {
    Ok(())
  }

  fn api_config(&self, web: &mut web::ServiceConfig) {
    web
      .service(login)
      .service(current_user);
  }
}

pub fn new_factory() -> AuthService {
  Default::default()
}
