use log::*;

use actix_web::{get, post, patch, delete, web, HttpResponse};

use uuid::Uuid;

use crate::error::*;
use crate::app::*;
use crate::forms::*;
use crate::models::*;
use crate::auth::AuthData;
use crate::github::GithubClient;

use crate::db::DbService;

use crate::middleware::Auth;

use super::parse_id;

async fn load_user(db: &DbService, user_id: Uuid) -> Result<User> {
  db.find_user_by_id(user_id).await?
    .ok_or_else(|| Error::not_found("User not found"))
}

/// Profile of `user_id` for an edit of its experience or education.
async fn load_profile(db: &DbService, user_id: Uuid) -> Result<Profile> {
  db.find_profile_by_user(user_id).await?
    .ok_or_else(|| Error::bad_request("There is no profile for this user"))
}

/// get current user's profile
#[get("/profile/me", wrap = "Auth")]
async fn current(
  auth: AuthData,
  db: web::Data<DbService>,
) -> Result<HttpResponse> {
  match db.profile_details_by_user(auth.user_id).await? {
    Some(profile) => Ok(HttpResponse::Ok().json(profile)),
    None => Err(Error::bad_request("There is no profile for this user")),
  }
}

/// create or update current user's profile
#[post("/profile", wrap = "Auth")]
async fn upsert(
  auth: AuthData,
  db: web::Data<DbService>,
  form: web::Json<CreateProfile>,
) -> Result<HttpResponse> {
  form.validate()?;
  let user = load_user(&db, auth.user_id).await?;

  let mut profile = match db.find_profile_by_user(user.id).await? {
    Some(profile) => profile,
    None => {
      info!("creating profile for user {}", user.id);
      Profile::new(user.id)
    },
  };
  form.into_inner().apply(&mut profile);
  db.save_profile(&profile).await?;

  Ok(HttpResponse::Ok().json(profile.with_user(user.summary())))
}

/// list all profiles
#[get("/profile")]
async fn list(
  db: web::Data<DbService>,
) -> Result<HttpResponse> {
  Ok(HttpResponse::Ok().json(db.list_profile_details().await?))
}

/// get profile by user id
#[get("/profile/user/{user_id}")]
async fn by_user(
  db: web::Data<DbService>,
  user_id: web::Path<String>,
) -> Result<HttpResponse> {
  let user_id = parse_id(&user_id, "No profile for that user")?;
  match db.profile_details_by_user(user_id).await? {
    Some(profile) => Ok(HttpResponse::Ok().json(profile)),
    None => Err(Error::not_found("No profile for that user")),
  }
}

/// delete current user with profile and posts
#[delete("/profile", wrap = "Auth")]
async fn delete_account(
  auth: AuthData,
  db: web::Data<DbService>,
) -> Result<HttpResponse> {
  db.delete_account(auth.user_id).await?;
  info!("deleted user {}", auth.user_id);
  Ok(HttpResponse::Ok().json(json!({ "msg": "User deleted from database" })))
}

/// add experience to current user's profile
#[patch("/profile/experience", wrap = "Auth")]
async fn add_experience(
  auth: AuthData,
  db: web::Data<DbService>,
  form: web::Json<AddExperience>,
) -> Result<HttpResponse> {
  let experience = form.into_inner().into_experience()?;
  let user = load_user(&db, auth.user_id).await?;
  let mut profile = load_profile(&db, user.id).await?;

  profile.add_experience(experience);
  db.save_profile(&profile).await?;
  Ok(HttpResponse::Ok().json(profile.with_user(user.summary())))
}

/// remove experience from current user's profile
#[delete("/profile/experience/{exp_id}", wrap = "Auth")]
async fn delete_experience(
  auth: AuthData,
  db: web::Data<DbService>,
  exp_id: web::Path<String>,
) -> Result<HttpResponse> {
  let exp_id = parse_id(&exp_id, "Experience not found")?;
  let user = load_user(&db, auth.user_id).await?;
  let mut profile = load_profile(&db, user.id).await?;

  profile.remove_experience(exp_id)?;
  db.save_profile(&profile).await?;
  Ok(HttpResponse::Ok().json(profile.with_user(user.summary())))
}

/// add education to current user's profile
#[patch("/profile/education", wrap = "Auth")]
async fn add_education(
  auth: AuthData,
  db: web::Data<DbService>,
  form: web::Json<AddEducation>,
) -> Result<HttpResponse> {
  let education = form.into_inner().into_education()?;
  let user = load_user(&db, auth.user_id).await?;
  let mut profile = load_profile(&db, user.id).await?;

  profile.add_education(education);
  db.save_profile(&profile).await?;
  Ok(HttpResponse::Ok().json(profile.with_user(user.summary())))
}

/// remove education from current user's profile
#[delete("/profile/education/{edu_id}", wrap = "Auth")]
async fn delete_education(
  auth: AuthData,
  db: web::Data<DbService>,
  edu_id: web::Path<String>,
) -> Result<HttpResponse> {
  let edu_id = parse_id(&edu_id, "Education not found")?;
  let user = load_user(&db, auth.user_id).await?;
  let mut profile = load_profile(&db, user.id).await?;

  profile.remove_education(edu_id)?;
  db.save_profile(&profile).await?;
  Ok(HttpResponse::Ok().json(profile.with_user(user.summary())))
}

/// public repositories of a GitHub user
#[get("/profile/github/{username}")]
async fn github_repos(
  cfg: web::Data<ProfileService>,
  username: web::Path<String>,
) -> Result<HttpResponse> {
  let repos = cfg.github.user_repos(&username).await?;
  Ok(HttpResponse::Ok().json(repos))
}

#[derive(Debug, Clone)]
pub struct ProfileService {
  github: GithubClient,
}

impl super::Service for ProfileService {
  fn load_app_config(&mut self, config: &AppConfig, _prefix: &str) -> Result<()> {
    self.github = GithubClient::load_app_config(config)?;
    Ok(())
  }

  fn api_config(&self, web: &mut web::ServiceConfig) {
    web
      .app_data(web::Data::new(self.clone()))
      .service(current)
      .service(list)
      .service(by_user)
      .service(upsert)
      .service(delete_account)
      .service(add_experience)
      .service(delete_experience)
      .service(add_education)
      .service(delete_education)
      .service(github_repos);
  }
}

pub fn new_factory() -> Result<ProfileService> {
  Ok(ProfileService {
    github: GithubClient::new(crate::github::DEFAULT_API_URL, None)?,
  })
}
