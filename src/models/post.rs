use chrono::{DateTime, Utc};

use serde::{Deserialize, Serialize};

use uuid::Uuid;

use crate::error::*;
use crate::models::User;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Like {
  #[serde(rename = "_id")]
  pub id: Uuid,
  pub user: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
  #[serde(rename = "_id")]
  pub id: Uuid,
  pub user: Uuid,
  pub text: String,
  pub name: String,
  pub avatar: String,
  pub date: DateTime<Utc>,
}

impl Comment {
  /// Snapshot of the author's name/avatar at comment time.
  pub fn new(author: &User, text: &str) -> Self {
    Self {
      id: Uuid::new_v4(),
      user: author.id,
      text: text.to_string(),
      name: author.name.clone(),
      avatar: author.avatar.clone(),
      date: Utc::now(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
  #[serde(rename = "_id")]
  pub id: Uuid,
  pub user: Uuid,
  pub text: String,
  pub name: String,
  pub avatar: String,
  #[serde(default)]
  pub likes: Vec<Like>,
  #[serde(default)]
  pub comments: Vec<Comment>,
  pub date: DateTime<Utc>,
}

impl Post {
  /// The author's name/avatar are copied and not kept in sync afterwards.
  pub fn new(author: &User, text: &str, name: Option<&str>) -> Self {
    Self {
      id: Uuid::new_v4(),
      user: author.id,
      text: text.to_string(),
      name: name.unwrap_or(&author.name).to_string(),
      avatar: author.avatar.clone(),
      likes: Vec::new(),
      comments: Vec::new(),
      date: Utc::now(),
    }
  }

  pub fn check_owner(&self, user_id: Uuid) -> Result<()> {
    if self.user != user_id {
      return Err(Error::unauthorized("You can only delete your own posts"));
    }
    Ok(())
  }

  pub fn is_liked_by(&self, user_id: Uuid) -> bool {
    self.likes.iter().any(|like| like.user == user_id)
  }

  pub fn like(&mut self, user_id: Uuid) -> Result<()> {
    if self.is_liked_by(user_id) {
      return Err(Error::bad_request("Posts can be liked only once"));
    }
    self.likes.insert(0, Like {
      id: Uuid::new_v4(),
      user: user_id,
    });
    Ok(())
  }

  pub fn unlike(&mut self, user_id: Uuid) -> Result<()> {
    match self.likes.iter().position(|like| like.user == user_id) {
      Some(idx) => {
        self.likes.remove(idx);
        Ok(())
      },
      None => Err(Error::bad_request("Post has not yet been liked")),
    }
  }

  pub fn add_comment(&mut self, comment: Comment) {
    self.comments.insert(0, comment);
  }

  /// Only the comment's author may remove it.
  pub fn remove_comment(&mut self, comment_id: Uuid, user_id: Uuid) -> Result<Comment> {
    let idx = self.comments.iter().position(|c| c.id == comment_id)
      .ok_or_else(|| Error::not_found("Comment does not exist"))?;
    if self.comments[idx].user != user_id {
      return Err(Error::unauthorized("User not authorized"));
    }
    Ok(self.comments.remove(idx))
  }
}
