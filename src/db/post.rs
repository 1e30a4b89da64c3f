use crate::error::*;
use crate::models::*;

use crate::db::*;
use crate::db::util::*;

use tokio_postgres::{Row, types::Json};

use uuid::Uuid;

#[derive(Clone)]
pub struct PostService {
  // get one post
  post_by_id: VersionedStatement,

  // get all posts
  get_posts: VersionedStatement,

  // store post
  store_post: VersionedStatement,

  // delete post(s)
  delete_post: VersionedStatement,
  delete_by_user: VersionedStatement,
}

lazy_static! {
  static ref POST_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "posts",
      columns: vec![
        column("id"),
        column("user_id"),
        column("date"),
        column("doc"),
      ],
    }
  };
}

fn post_from_row(row: &Row) -> Post {
  let Json(post): Json<Post> = row.get(0);
  post
}

impl PostService {
  pub fn new(cl: SharedClient) -> PostService {
    let post_by_id = VersionedStatement::new(cl.clone(),
        r#"SELECT doc FROM posts WHERE id = $1"#);

    let get_posts = VersionedStatement::new(cl.clone(),
        r#"SELECT doc FROM posts ORDER BY date DESC"#);

    let store_post = VersionedStatement::new(cl.clone(),
        &POST_COLUMNS.build_upsert("(id)"));

    let delete_post = VersionedStatement::new(cl.clone(),
        r#"DELETE FROM posts WHERE id = $1"#);
    let delete_by_user = VersionedStatement::new(cl.clone(),
        r#"DELETE FROM posts WHERE user_id = $1"#);

    PostService {
      post_by_id,

      get_posts,

      store_post,

      delete_post,
      delete_by_user,
    }
  }

  pub async fn prepare(&self) -> Result<()> {
    self.post_by_id.prepare().await?;

    self.get_posts.prepare().await?;

    self.store_post.prepare().await?;

    self.delete_post.prepare().await?;
    self.delete_by_user.prepare().await?;

    Ok(())
  }

  pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Post>> {
    let row = self.post_by_id.query_opt(&[&id]).await?;
    Ok(row.as_ref().map(post_from_row))
  }

  pub async fn get_posts(&self) -> Result<Vec<Post>> {
    let rows = self.get_posts.query(&[]).await?;
    Ok(rows.iter().map(post_from_row).collect())
  }

  pub async fn store(&self, post: &Post) -> Result<()> {
    self.store_post.execute(&[&post.id, &post.user, &post.date, &Json(post)]).await?;
    Ok(())
  }

  pub async fn delete(&self, id: Uuid) -> Result<u64> {
    self.delete_post.execute(&[&id]).await
  }

  pub async fn delete_by_user(&self, user_id: Uuid) -> Result<u64> {
    self.delete_by_user.execute(&[&user_id]).await
  }
}
