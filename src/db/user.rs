use crate::error::*;
use crate::models::*;

use crate::db::*;
use crate::db::util::*;

use tokio_postgres::Row;

use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
  // gets
  user_by_id: VersionedStatement,
  user_by_email: VersionedStatement,

  // store user
  store_user: VersionedStatement,
  update_password: VersionedStatement,

  // delete user
  delete_user: VersionedStatement,
}

lazy_static! {
  static ref USER_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "users",
      columns: vec![
        column("id"),
        column("name"),
        column("email"),
        column("password"),
        column("avatar"),
        column("date"),
      ],
    }
  };
}

fn user_from_row(row: &Row) -> User {
  User {
    id: row.get(0),
    name: row.get(1),
    email: row.get(2),
    password: row.get(3),
    avatar: row.get(4),
    date: row.get(5),
  }
}

impl UserService {
  pub fn new(cl: SharedClient) -> UserService {
    let select = USER_COLUMNS.build_select_query();
    // Build user_by_* queries
    let user_by_id = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE id = $1"#, select));
    let user_by_email = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE email = $1"#, select));

    let store_user = VersionedStatement::new(cl.clone(),
        &USER_COLUMNS.build_insert_query());
    let update_password = VersionedStatement::new(cl.clone(),
        r#"UPDATE users SET password = $2 WHERE id = $1"#);

    let delete_user = VersionedStatement::new(cl.clone(),
        r#"DELETE FROM users WHERE id = $1"#);

    UserService {
      user_by_id,
      user_by_email,

      store_user,
      update_password,

      delete_user,
    }
  }

  pub async fn prepare(&self) -> Result<()> {
    self.user_by_id.prepare().await?;
    self.user_by_email.prepare().await?;

    self.store_user.prepare().await?;
    self.update_password.prepare().await?;

    self.delete_user.prepare().await?;

    Ok(())
  }

  pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>> {
    let row = self.user_by_id.query_opt(&[&id]).await?;
    Ok(row.as_ref().map(user_from_row))
  }

  pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
    let email = email.trim().to_lowercase();
    let row = self.user_by_email.query_opt(&[&email]).await?;
    Ok(row.as_ref().map(user_from_row))
  }

  pub async fn store(&self, user: &User) -> Result<()> {
    self.store_user.execute(&[
        &user.id, &user.name, &user.email, &user.password, &user.avatar, &user.date
    ]).await?;
    Ok(())
  }

  pub async fn update_password(&self, id: Uuid, password: &str) -> Result<u64> {
    self.update_password.execute(&[&id, &password]).await
  }

  pub async fn delete(&self, id: Uuid) -> Result<u64> {
    self.delete_user.execute(&[&id]).await
  }
}
