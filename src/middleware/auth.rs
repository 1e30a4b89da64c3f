use log::*;

use futures::future::{ok, err, ready, LocalBoxFuture, Ready};

use actix_web::{
  body::EitherBody,
  dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
  http::header::{HeaderMap, AUTHORIZATION},
  web, HttpMessage, HttpRequest, FromRequest, ResponseError,
};

use crate::error::{Error, Result};
use crate::auth::jwt::*;

const TOKEN_PREFIX: &str = "Bearer ";
const LEGACY_TOKEN_HEADER: &str = "x-auth-token";

/// Pull the bearer token out of the request headers.
pub fn extract_token(headers: &HeaderMap) -> Result<Option<String>> {
  if let Some(token) = headers.get(AUTHORIZATION) {
    let token = token.to_str()
      .map_err(|_| Error::unauthorized("Token is not valid"))?;
    return match token.strip_prefix(TOKEN_PREFIX) {
      Some(token) => Ok(Some(token.trim().to_string())),
      None => Err(Error::unauthorized("Invalid authorization method")),
    };
  }
  match headers.get(LEGACY_TOKEN_HEADER) {
    Some(token) => {
      let token = token.to_str()
        .map_err(|_| Error::unauthorized("Token is not valid"))?;
      Ok(Some(token.trim().to_string()))
    },
    None => Ok(None),
  }
}

pub fn decode_jwt_claims(headers: &HeaderMap, keys: &JwtConfig) -> Result<AuthData> {
  match extract_token(headers)? {
    Some(token) => token.decode_jwt(keys),
    None => Err(Error::unauthorized("No token, authorization denied")),
  }
}

impl FromRequest for AuthData {
  type Error = Error;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
    match req.extensions().get::<AuthData>() {
      Some(auth) => {
        ok(auth.clone())
      },
      None => {
        err(Error::unauthorized("No token, authorization denied"))
      }
    }
  }
}

/// Rejects requests without a valid token.
pub struct Auth;

impl<S, B> Transform<S, ServiceRequest> for Auth
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = actix_web::Error;
  type InitError = ();
  type Transform = AuthMiddleware<S>;
  type Future = Ready<Result<Self::Transform, Self::InitError>>;

  fn new_transform(&self, service: S) -> Self::Future {
    ready(Ok(AuthMiddleware {
      service
    }))
  }
}

pub struct AuthMiddleware<S> {
  service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = actix_web::Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  forward_ready!(service);

  fn call(&self, req: ServiceRequest) -> Self::Future {
    let checked = match req.app_data::<web::Data<JwtConfig>>() {
      Some(keys) => decode_jwt_claims(req.headers(), keys),
      None => {
        error!("Auth middleware used without JwtConfig app data");
        Err(Error::InternalServerError)
      },
    };

    match checked {
      Ok(auth_data) => {
        debug!("Has authorization token: {:?}", auth_data);
        req.extensions_mut().insert(auth_data);
        let fut = self.service.call(req);
        Box::pin(async move {
          fut.await.map(ServiceResponse::map_into_left_body)
        })
      },
      Err(err) => {
        debug!("Auth check failed: {:?}", err);
        let res = req.into_response(err.error_response()).map_into_right_body();
        Box::pin(async move { Ok(res) })
      },
    }
  }
}
