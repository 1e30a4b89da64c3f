//! Push notifications for connected clients through the Pusher REST API.
//!
//! Triggers are fire-and-forget: they run in a spawned task after the
//! write has been committed and failures are only logged.

use log::*;

use std::sync::Arc;

use chrono::Utc;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use serde::Serialize;
use sha2::Sha256;

use crate::app::AppConfig;
use crate::error::*;

pub const NEW_POST: &str = "new-post";
pub const DELETE_POST: &str = "delete-post";
pub const UPDATE_LIKES: &str = "update-likes";
pub const ADD_COMMENT: &str = "add-comment";
pub const REMOVE_COMMENT: &str = "remove-comment";

pub const DEFAULT_CHANNEL: &str = "posts";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone)]
pub struct PusherConfig {
  pub app_id: String,
  pub key: String,
  pub secret: String,
  pub base_url: String,
  pub channel: String,
}

impl PusherConfig {
  /// `None` unless app id, key and secret are all configured.
  pub fn load_app_config(config: &AppConfig) -> Result<Option<Self>> {
    let app_id = config.get_str_or_env("pusher.app_id", "PUSHER_APP_ID")?;
    let key = config.get_str_or_env("pusher.key", "PUSHER_KEY")?;
    let secret = config.get_str_or_env("pusher.secret", "PUSHER_SECRET")?;
    let (app_id, key, secret) = match (app_id, key, secret) {
      (Some(app_id), Some(key), Some(secret)) => (app_id, key, secret),
      _ => return Ok(None),
    };
    let cluster = config.get_str_or_env("pusher.cluster", "PUSHER_CLUSTER")?;
    let base_url = match config.get_str("pusher.base_url")? {
      Some(url) => url,
      None => match cluster {
        Some(cluster) => format!("https://api-{}.pusher.com", cluster),
        None => "https://api.pusherapp.com".to_string(),
      },
    };
    let channel = config.get_str("pusher.channel")?
      .unwrap_or_else(|| DEFAULT_CHANNEL.to_string());
    Ok(Some(Self {
      app_id,
      key,
      secret,
      base_url: base_url.trim_end_matches('/').to_string(),
      channel,
    }))
  }
}

#[derive(Debug, Serialize)]
struct TriggerBody<'a> {
  name: &'a str,
  channels: [&'a str; 1],
  data: &'a str,
}

/// HMAC-SHA256 signature of a Pusher REST request, hex encoded.
/// `query` must be sorted by key and exclude `auth_signature`.
pub fn sign_request(secret: &str, method: &str, path: &str, query: &str) -> Result<String> {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .map_err(|e| anyhow::anyhow!("invalid pusher secret: {}", e))?;
  mac.update(format!("{}\n{}\n{}", method, path, query).as_bytes());
  Ok(hex::encode(mac.finalize().into_bytes()))
}

#[derive(Debug, Clone)]
pub struct Broadcaster {
  client: reqwest::Client,
  pusher: Option<Arc<PusherConfig>>,
}

impl Broadcaster {
  pub fn new(pusher: Option<PusherConfig>) -> Self {
    Self {
      client: reqwest::Client::new(),
      pusher: pusher.map(Arc::new),
    }
  }

  pub fn disabled() -> Self {
    Self::new(None)
  }

  pub fn load_app_config(config: &AppConfig) -> Result<Self> {
    let pusher = PusherConfig::load_app_config(config)?;
    match pusher {
      Some(ref pusher) => info!("Broadcasting to pusher app {} on channel '{}'", pusher.app_id, pusher.channel),
      None => info!("Pusher not configured, broadcasts disabled."),
    }
    Ok(Self::new(pusher))
  }

  pub fn is_enabled(&self) -> bool {
    self.pusher.is_some()
  }

  /// Fire-and-forget.  Must be called from within the actix runtime.
  pub fn trigger<T: Serialize>(&self, event: &'static str, data: &T) {
    if !self.is_enabled() {
      debug!("broadcast disabled, dropping '{}'", event);
      return;
    }
    let data = match serde_json::to_string(data) {
      Ok(data) => data,
      Err(err) => {
        warn!("broadcast '{}': failed to encode payload: {}", event, err);
        return;
      },
    };
    let this = self.clone();
    actix_rt::spawn(async move {
      if let Err(err) = this.send(event, &data).await {
        warn!("broadcast '{}' failed: {}", event, err);
      }
    });
  }

  pub async fn send(&self, event: &str, data: &str) -> Result<()> {
    let pusher = match self.pusher {
      Some(ref pusher) => pusher,
      None => return Ok(()),
    };
    let body = serde_json::to_vec(&TriggerBody {
      name: event,
      channels: [pusher.channel.as_str()],
      data,
    })?;

    let path = format!("/apps/{}/events", pusher.app_id);
    let query = format!("auth_key={}&auth_timestamp={}&auth_version=1.0&body_md5={}",
      pusher.key, Utc::now().timestamp(), hex::encode(Md5::digest(&body)));
    let signature = sign_request(&pusher.secret, "POST", &path, &query)?;
    let url = format!("{}{}?{}&auth_signature={}", pusher.base_url, path, query, signature);

    self.client.post(&url)
      .header(reqwest::header::CONTENT_TYPE, "application/json")
      .body(body)
      .send()
      .await?
      .error_for_status()?;
    debug!("broadcast '{}' sent", event);
    Ok(())
  }
}
