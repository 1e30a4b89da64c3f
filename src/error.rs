use log::*;

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use libreauth::pass;

use jsonwebtoken::errors::Error as JwtError;

use thiserror::Error;

/// One failed check on a request field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldError {
  pub msg: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub param: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,
}

impl FieldError {
  pub fn body(param: &str, msg: &str) -> Self {
    Self {
      msg: msg.to_string(),
      param: Some(param.to_string()),
      location: Some("body".to_string()),
    }
  }

  pub fn message(msg: &str) -> Self {
    Self {
      msg: msg.to_string(),
      param: None,
      location: None,
    }
  }
}

#[derive(Error, Debug)]
pub enum Error {
  // 400
  #[error("validation failed: {0:?}")]
  Validation(Vec<FieldError>),

  // 400
  #[error("bad request: {0}")]
  BadRequest(JsonValue),

  // 401
  #[error("unauthorized: {0}")]
  Unauthorized(JsonValue),

  // 404
  #[error("not found: {0}")]
  NotFound(JsonValue),

  // 500
  #[error("internal server error")]
  InternalServerError,

  // Json error
  #[error("Json error: {source}")]
  JsonError {
    #[from]
    source: serde_json::Error,
  },

  // Password error
  #[error("Password error: {0}")]
  PasswordError(String),

  #[error("JWT error")]
  JwtError {
    #[from]
    source: JwtError,
  },

  #[error("disconnected: {0}")]
  DisconnectedError(String),

  #[error("postgres error")]
  PgError {
    #[from]
    source: tokio_postgres::error::Error,
  },

  #[error("http client error: {source}")]
  HttpClientError {
    #[from]
    source: reqwest::Error,
  },

  #[error("std io error")]
  IOError {
    #[from]
    source: std::io::Error,
  },

  #[error("config error: {source}")]
  ConfigError {
    #[from]
    source: config::ConfigError,
  },

  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

impl Error {
  pub fn bad_request(msg: &str) -> Self {
    Error::BadRequest(json!({ "msg": msg }))
  }

  pub fn unauthorized(msg: &str) -> Self {
    Error::Unauthorized(json!({ "msg": msg }))
  }

  pub fn not_found(msg: &str) -> Self {
    Error::NotFound(json!({ "msg": msg }))
  }

  /// Single validation error without a field, e.g. "User already exists".
  pub fn rejected(msg: &str) -> Self {
    Error::Validation(vec![FieldError::message(msg)])
  }
}

impl From<pass::Error> for Error {
  fn from(err: pass::Error) -> Self {
    // length limits are counted after unicode normalization.
    match err {
      pass::Error::PasswordTooShort { min, .. } => Error::Validation(vec![FieldError::body(
        "password", &format!("Please enter a password with {} or more characters", min))]),
      pass::Error::PasswordTooLong { max, .. } => Error::Validation(vec![FieldError::body(
        "password", &format!("Please enter a password with {} or fewer characters", max))]),
      err => Error::PasswordError(format!("{:?}", err)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// the ResponseError trait lets us convert errors to http responses with appropriate data
// https://actix.rs/docs/errors/
impl ResponseError for Error {
  fn status_code(&self) -> StatusCode {
    match self {
      Error::Validation(_) | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::Unauthorized(_) | Error::JwtError { .. } => StatusCode::UNAUTHORIZED,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    match self {
      Error::Validation(ref errors) => {
        HttpResponse::BadRequest().json(json!({ "errors": errors }))
      },
      Error::BadRequest(ref message) => HttpResponse::BadRequest().json(message),
      Error::Unauthorized(ref message) => HttpResponse::Unauthorized().json(message),
      Error::JwtError { ref source } => {
        debug!("Rejected token: {}", source);
        HttpResponse::Unauthorized().json(json!({ "msg": "Token is not valid" }))
      },
      Error::NotFound(ref message) => HttpResponse::NotFound().json(message),
      ref err => {
        error!("InternalServerError: {:?}", err);
        HttpResponse::InternalServerError().json(json!({ "msg": "Server error" }))
      },
    }
  }
}
