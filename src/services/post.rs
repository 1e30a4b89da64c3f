use log::*;

use actix_web::{get, post, put, delete, web, HttpResponse};

use uuid::Uuid;

use crate::error::*;
use crate::app::*;
use crate::forms::*;
use crate::models::*;
use crate::auth::AuthData;
use crate::realtime::{self, Broadcaster};

use crate::db::DbService;

use crate::middleware::Auth;

use super::parse_id;

async fn load_post(db: &DbService, id: &str) -> Result<Post> {
  let id = parse_id(id, "Post not found")?;
  db.find_post(id).await?
    .ok_or_else(|| Error::not_found("Post not found"))
}

async fn load_author(db: &DbService, user_id: Uuid) -> Result<User> {
  db.find_user_by_id(user_id).await?
    .ok_or_else(|| Error::not_found("User not found"))
}

/// create post
#[post("/posts", wrap = "Auth")]
async fn create(
  auth: AuthData,
  db: web::Data<DbService>,
  broadcaster: web::Data<Broadcaster>,
  form: web::Json<CreatePost>,
) -> Result<HttpResponse> {
  let text = form.validate()?;
  let author = load_author(&db, auth.user_id).await?;

  let post = Post::new(&author, text, form.name());
  db.save_post(&post).await?;
  debug!("user {} created post {}", author.id, post.id);

  broadcaster.trigger(realtime::NEW_POST, &post);
  Ok(HttpResponse::Created().json(post))
}

/// list posts, newest first
#[get("/posts", wrap = "Auth")]
async fn list(
  db: web::Data<DbService>,
) -> Result<HttpResponse> {
  Ok(HttpResponse::Ok().json(db.list_posts().await?))
}

/// get post by id
#[get("/posts/{id}", wrap = "Auth")]
async fn get_post(
  db: web::Data<DbService>,
  id: web::Path<String>,
) -> Result<HttpResponse> {
  Ok(HttpResponse::Ok().json(load_post(&db, &id).await?))
}

/// delete own post
#[delete("/posts/{id}", wrap = "Auth")]
async fn delete_post(
  auth: AuthData,
  db: web::Data<DbService>,
  broadcaster: web::Data<Broadcaster>,
  id: web::Path<String>,
) -> Result<HttpResponse> {
  let post = load_post(&db, &id).await?;
  post.check_owner(auth.user_id)?;
  db.delete_post(post.id).await?;

  broadcaster.trigger(realtime::DELETE_POST, &json!({ "id": post.id }));
  Ok(HttpResponse::Ok().json(json!({ "msg": "Post successfully deleted" })))
}

/// like a post
#[put("/posts/like/{id}", wrap = "Auth")]
async fn like(
  auth: AuthData,
  db: web::Data<DbService>,
  broadcaster: web::Data<Broadcaster>,
  id: web::Path<String>,
) -> Result<HttpResponse> {
  let mut post = load_post(&db, &id).await?;
  post.like(auth.user_id)?;
  db.save_post(&post).await?;

  broadcaster.trigger(realtime::UPDATE_LIKES, &json!({ "id": post.id, "likes": post.likes }));
  Ok(HttpResponse::Ok().json(post.likes))
}

/// remove own like from a post
#[put("/posts/unlike/{id}", wrap = "Auth")]
async fn unlike(
  auth: AuthData,
  db: web::Data<DbService>,
  broadcaster: web::Data<Broadcaster>,
  id: web::Path<String>,
) -> Result<HttpResponse> {
  let mut post = load_post(&db, &id).await?;
  post.unlike(auth.user_id)?;
  db.save_post(&post).await?;

  broadcaster.trigger(realtime::UPDATE_LIKES, &json!({ "id": post.id, "likes": post.likes }));
  Ok(HttpResponse::Ok().json(post.likes))
}

/// comment on a post
#[post("/posts/comment/{id}", wrap = "Auth")]
async fn add_comment(
  auth: AuthData,
  db: web::Data<DbService>,
  broadcaster: web::Data<Broadcaster>,
  id: web::Path<String>,
  form: web::Json<CreateComment>,
) -> Result<HttpResponse> {
  let text = form.validate()?;
  let author = load_author(&db, auth.user_id).await?;
  let mut post = load_post(&db, &id).await?;

  post.add_comment(Comment::new(&author, text));
  db.save_post(&post).await?;

  broadcaster.trigger(realtime::ADD_COMMENT, &json!({ "id": post.id, "comments": post.comments }));
  Ok(HttpResponse::Ok().json(post.comments))
}

/// delete own comment
#[delete("/posts/comment/{id}/{comment_id}", wrap = "Auth")]
async fn delete_comment(
  auth: AuthData,
  db: web::Data<DbService>,
  broadcaster: web::Data<Broadcaster>,
  path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
  let (id, comment_id) = path.into_inner();
  let mut post = load_post(&db, &id).await?;
  let comment_id = parse_id(&comment_id, "Comment does not exist")?;

  post.remove_comment(comment_id, auth.user_id)?;
  db.save_post(&post).await?;

  broadcaster.trigger(realtime::REMOVE_COMMENT, &json!({ "id": post.id, "comments": post.comments }));
  Ok(HttpResponse::Ok().json(post.comments))
}

#[derive(Debug, Clone, Default)]
pub struct PostService {
}

impl super::Service for PostService {
  fn load_app_config(&mut self, _config: &AppConfig, _prefix: &str) -> Result<()> {
    Ok(())
  }

  fn api_config(&self, web: &mut web::ServiceConfig) {
    web
      .service(create)
      .service(list)
      .service(get_post)
      .service(delete_post)
      .service(like)
      .service(unlike)
      .service(add_comment)
      .service(delete_comment);
  }
}

pub fn new_factory() -> PostService {
  Default::default()
}
