use serde::{Deserialize, Serialize};

use chrono::{Duration, Utc};

use jsonwebtoken::{
  encode, Header, EncodingKey,
  decode, DecodingKey,
  Validation
};

use uuid::Uuid;

use crate::app::AppConfig;
use crate::error::*;
use crate::models::User;

/// Identity attached to a request by the `Auth` middleware.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthData {
  pub user_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
  pub id: Uuid,
  pub exp: i64,
}

/// Token signing settings, shared with every worker.
#[derive(Clone)]
pub struct JwtConfig {
  secret: String,
  token_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("JwtConfig")
      .field("token_hours", &self.token_hours)
      .finish()
  }
}

impl JwtConfig {
  pub fn new(secret: &str, token_hours: i64) -> Self {
    Self {
      secret: secret.to_string(),
      token_hours,
    }
  }

  pub fn load_app_config(config: &AppConfig) -> Result<Self> {
    let secret = match config.get_str("auth.jwt_secret")? {
      Some(secret) => secret,
      None => dotenv::var("JWT_SECRET")
        .map_err(|_| anyhow::anyhow!("auth.jwt_secret or JWT_SECRET must be set"))?,
    };
    let token_hours = config.get_int("auth.token_hours")?.unwrap_or(100);
    Ok(Self::new(&secret, token_hours))
  }
}

pub trait GenerateJwt {
  fn generate_jwt(&self, keys: &JwtConfig) -> Result<String>;
}

pub trait DecodeJwt {
  fn decode_jwt(&self, keys: &JwtConfig) -> Result<AuthData>;
}

impl GenerateJwt for User {
  fn generate_jwt(&self, keys: &JwtConfig) -> Result<String> {
    let claims = Claims{
      id: self.id,
      exp: (Utc::now() + Duration::hours(keys.token_hours)).timestamp(),
    };

    let header = Header::default();
    let secret = &EncodingKey::from_secret(keys.secret.as_ref());
    let token = encode(&header, &claims, secret)?;

    Ok(token)
  }
}

impl DecodeJwt for str {
  fn decode_jwt(&self, keys: &JwtConfig) -> Result<AuthData> {
    let secret_key = DecodingKey::from_secret(keys.secret.as_ref());
    let token = decode::<Claims>(self, &secret_key, &Validation::default())?;
    Ok(AuthData{
      user_id: token.claims.id,
    })
  }
}
