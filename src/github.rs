use log::*;

use regex::Regex;

use serde_json::Value as JsonValue;

use crate::app::AppConfig;
use crate::error::*;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

lazy_static! {
  static ref GITHUB_LOGIN_RE: Regex = Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,38})$").unwrap();
}

/// Read-only proxy for a user's public GitHub repositories.
#[derive(Debug, Clone)]
pub struct GithubClient {
  client: reqwest::Client,
  api_url: String,
  credentials: Option<(String, String)>,
}

impl GithubClient {
  pub fn new(api_url: &str, credentials: Option<(String, String)>) -> Result<Self> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("devconnector/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self {
      client,
      api_url: api_url.trim_end_matches('/').to_string(),
      credentials,
    })
  }

  pub fn load_app_config(config: &AppConfig) -> Result<Self> {
    let api_url = config.get_str("github.api_url")?
      .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let client_id = config.get_str_or_env("github.client_id", "GITHUB_CLIENT_ID")?;
    let client_secret = config.get_str_or_env("github.client_secret", "GITHUB_CLIENT_SECRET")?;
    let credentials = match (client_id, client_secret) {
      (Some(id), Some(secret)) => Some((id, secret)),
      _ => None,
    };
    Self::new(&api_url, credentials)
  }

  /// Latest 10 repositories of `username`, oldest first.
  pub async fn user_repos(&self, username: &str) -> Result<JsonValue> {
    if !GITHUB_LOGIN_RE.is_match(username) {
      return Err(Error::not_found("Github profile not found"));
    }
    let url = format!("{}/users/{}/repos", self.api_url, username);
    let mut req = self.client.get(&url)
      .query(&[("per_page", "10"), ("sort", "created:asc")]);
    if let Some((ref id, ref secret)) = self.credentials {
      req = req.basic_auth(id, Some(secret));
    }

    let res = req.send().await?;
    if res.status() != reqwest::StatusCode::OK {
      info!("GitHub returned {} for {}", res.status(), username);
      return Err(Error::not_found("Github profile not found"));
    }
    Ok(res.json().await?)
  }
}
