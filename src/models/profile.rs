use chrono::{DateTime, NaiveDate, Utc};

use serde::{Deserialize, Serialize};

use uuid::Uuid;

use crate::error::*;
use crate::models::UserSummary;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Social {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub youtube: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub twitter: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub facebook: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub linkedin: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub instagram: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Experience {
  #[serde(rename = "_id")]
  pub id: Uuid,
  pub title: String,
  pub company: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,
  pub from: NaiveDate,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub to: Option<NaiveDate>,
  #[serde(default)]
  pub current: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Education {
  #[serde(rename = "_id")]
  pub id: Uuid,
  pub school: String,
  pub degree: String,
  pub field_of_study: String,
  pub from: NaiveDate,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub to: Option<NaiveDate>,
  #[serde(default)]
  pub current: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

/// Profile document.  The owner is kept outside of the document body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  #[serde(rename = "_id")]
  pub id: Uuid,
  #[serde(skip)]
  pub user_id: Uuid,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub company: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub website: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bio: Option<String>,
  pub status: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub github_username: Option<String>,
  #[serde(default)]
  pub skills: Vec<String>,
  #[serde(default)]
  pub social: Social,
  #[serde(default)]
  pub experience: Vec<Experience>,
  #[serde(default)]
  pub education: Vec<Education>,
  pub date: DateTime<Utc>,
}

impl Profile {
  pub fn new(user_id: Uuid) -> Self {
    Self {
      id: Uuid::new_v4(),
      user_id,
      company: None,
      website: None,
      location: None,
      bio: None,
      status: String::new(),
      github_username: None,
      skills: Vec::new(),
      social: Social::default(),
      experience: Vec::new(),
      education: Vec::new(),
      date: Utc::now(),
    }
  }

  /// Newest entries first.
  pub fn add_experience(&mut self, experience: Experience) {
    self.experience.insert(0, experience);
  }

  pub fn remove_experience(&mut self, id: Uuid) -> Result<Experience> {
    match self.experience.iter().position(|e| e.id == id) {
      Some(idx) => Ok(self.experience.remove(idx)),
      None => Err(Error::not_found("Experience not found")),
    }
  }

  /// Newest entries first.
  pub fn add_education(&mut self, education: Education) {
    self.education.insert(0, education);
  }

  pub fn remove_education(&mut self, id: Uuid) -> Result<Education> {
    match self.education.iter().position(|e| e.id == id) {
      Some(idx) => Ok(self.education.remove(idx)),
      None => Err(Error::not_found("Education not found")),
    }
  }

  pub fn with_user(self, user: UserSummary) -> ProfileDetails {
    ProfileDetails {
      profile: self,
      user,
    }
  }
}

/// Profile joined with its owner.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProfileDetails {
  #[serde(flatten)]
  pub profile: Profile,
  pub user: UserSummary,
}
