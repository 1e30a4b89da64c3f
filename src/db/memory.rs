use std::sync::Arc;

use async_trait::async_trait;

use parking_lot::Mutex;

use uuid::Uuid;

use crate::error::*;
use crate::models::*;

use super::DocumentStore;

#[derive(Debug, Default)]
struct Collections {
  users: Vec<User>,
  profiles: Vec<Profile>,
  posts: Vec<Post>,
}

impl Collections {
  fn details(&self, profile: &Profile) -> Option<ProfileDetails> {
    self.users.iter()
      .find(|u| u.id == profile.user_id)
      .map(|u| profile.clone().with_user(u.summary()))
  }
}

/// Process-local store.  All clones share the same collections.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  inner: Arc<Mutex<Collections>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Default::default()
  }
}

fn retain_count<T>(list: &mut Vec<T>, keep: impl Fn(&T) -> bool) -> u64 {
  let before = list.len();
  list.retain(|item| keep(item));
  (before - list.len()) as u64
}

#[async_trait(?Send)]
impl DocumentStore for MemoryStore {
  async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
    Ok(self.inner.lock().users.iter().find(|u| u.id == id).cloned())
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    let email = email.trim().to_lowercase();
    Ok(self.inner.lock().users.iter().find(|u| u.email == email).cloned())
  }

  async fn insert_user(&self, user: &User) -> Result<()> {
    let mut inner = self.inner.lock();
    if inner.users.iter().any(|u| u.id == user.id || u.email == user.email) {
      return Err(anyhow::anyhow!("duplicate user {}", user.email).into());
    }
    inner.users.push(user.clone());
    Ok(())
  }

  async fn update_password(&self, id: Uuid, password: &str) -> Result<u64> {
    let mut inner = self.inner.lock();
    match inner.users.iter_mut().find(|u| u.id == id) {
      Some(user) => {
        user.password = password.to_string();
        Ok(1)
      },
      None => Ok(0),
    }
  }

  async fn delete_user(&self, id: Uuid) -> Result<u64> {
    Ok(retain_count(&mut self.inner.lock().users, |u| u.id != id))
  }

  async fn find_profile_by_user(&self, user_id: Uuid) -> Result<Option<Profile>> {
    Ok(self.inner.lock().profiles.iter().find(|p| p.user_id == user_id).cloned())
  }

  async fn profile_details_by_user(&self, user_id: Uuid) -> Result<Option<ProfileDetails>> {
    let inner = self.inner.lock();
    Ok(inner.profiles.iter()
      .find(|p| p.user_id == user_id)
      .and_then(|p| inner.details(p)))
  }

  async fn list_profile_details(&self) -> Result<Vec<ProfileDetails>> {
    let inner = self.inner.lock();
    Ok(inner.profiles.iter().filter_map(|p| inner.details(p)).collect())
  }

  async fn save_profile(&self, profile: &Profile) -> Result<()> {
    let mut inner = self.inner.lock();
    match inner.profiles.iter_mut().find(|p| p.user_id == profile.user_id) {
      Some(existing) => *existing = profile.clone(),
      None => inner.profiles.push(profile.clone()),
    }
    Ok(())
  }

  async fn delete_profile_by_user(&self, user_id: Uuid) -> Result<u64> {
    Ok(retain_count(&mut self.inner.lock().profiles, |p| p.user_id != user_id))
  }

  async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
    Ok(self.inner.lock().posts.iter().find(|p| p.id == id).cloned())
  }

  async fn list_posts(&self) -> Result<Vec<Post>> {
    let mut posts: Vec<Post> = self.inner.lock().posts.iter().rev().cloned().collect();
    // stable, so equal dates stay newest-inserted first
    posts.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(posts)
  }

  async fn save_post(&self, post: &Post) -> Result<()> {
    let mut inner = self.inner.lock();
    match inner.posts.iter_mut().find(|p| p.id == post.id) {
      Some(existing) => *existing = post.clone(),
      None => inner.posts.push(post.clone()),
    }
    Ok(())
  }

  async fn delete_post(&self, id: Uuid) -> Result<u64> {
    Ok(retain_count(&mut self.inner.lock().posts, |p| p.id != id))
  }

  async fn delete_posts_by_user(&self, user_id: Uuid) -> Result<u64> {
    Ok(retain_count(&mut self.inner.lock().posts, |p| p.user != user_id))
  }
}
