use chrono::{DateTime, Utc};

use serde::{Deserialize, Serialize};

use sha2::{Digest, Sha256};

use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
  #[serde(rename = "_id")]
  pub id: Uuid,
  pub name: String,
  pub email: String,
  #[serde(skip_serializing, default)]
  pub password: String,
  pub avatar: String,
  pub date: DateTime<Utc>,
}

impl User {
  /// New user with a gravatar derived from the email.
  /// `password` must already be hashed.
  pub fn new(name: &str, email: &str, password: String) -> Self {
    let email = email.trim().to_lowercase();
    Self {
      id: Uuid::new_v4(),
      name: name.trim().to_string(),
      avatar: gravatar_url(&email),
      email,
      password,
      date: Utc::now(),
    }
  }

  pub fn summary(&self) -> UserSummary {
    UserSummary {
      id: self.id,
      name: self.name.clone(),
      avatar: self.avatar.clone(),
    }
  }
}

/// Public part of a user, embedded in profile responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
  #[serde(rename = "_id")]
  pub id: Uuid,
  pub name: String,
  pub avatar: String,
}

pub fn gravatar_url(email: &str) -> String {
  let hash = Sha256::digest(email.trim().to_lowercase().as_bytes());
  format!("https://www.gravatar.com/avatar/{}?s=200&r=pg&d=mm", hex::encode(hash))
}
