use crate::error::*;
use crate::models::*;

use crate::db::*;
use crate::db::util::*;

use tokio_postgres::{Row, types::Json};

use uuid::Uuid;

#[derive(Clone)]
pub struct ProfileService {
  // get one profile
  profile_by_user: VersionedStatement,
  details_by_user: VersionedStatement,

  // get all profiles
  get_profiles: VersionedStatement,

  // store profile
  store_profile: VersionedStatement,

  // delete profile
  delete_profile: VersionedStatement,
}

lazy_static! {
  static ref PROFILE_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "profiles",
      columns: vec![
        column("user_id"),
        column("doc"),
      ],
    }
  };
}

fn profile_from_row(row: &Row) -> Profile {
  let user_id: Uuid = row.get(0);
  let Json(mut profile): Json<Profile> = row.get(1);
  profile.user_id = user_id;
  profile
}

fn profile_details_from_row(row: &Row) -> ProfileDetails {
  let profile = profile_from_row(row);
  let name: String = row.get(2);
  let avatar: String = row.get(3);
  let user = UserSummary {
    id: profile.user_id,
    name,
    avatar,
  };
  profile.with_user(user)
}

static PROFILE_DETAILS_SELECT: &str = r#"
SELECT p.user_id, p.doc, u.name, u.avatar
FROM profiles p INNER JOIN users u ON p.user_id = u.id
"#;

impl ProfileService {
  pub fn new(cl: SharedClient) -> ProfileService {
    let profile_by_user = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE user_id = $1"#, PROFILE_COLUMNS.build_select_query()));
    let details_by_user = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE p.user_id = $1"#, PROFILE_DETAILS_SELECT));

    let get_profiles = VersionedStatement::new(cl.clone(),
        &format!(r#"{} ORDER BY p.created_at"#, PROFILE_DETAILS_SELECT));

    let store_profile = VersionedStatement::new(cl.clone(),
        &PROFILE_COLUMNS.build_upsert("(user_id)"));

    let delete_profile = VersionedStatement::new(cl.clone(),
        r#"DELETE FROM profiles WHERE user_id = $1"#);

    ProfileService {
      profile_by_user,
      details_by_user,

      get_profiles,

      store_profile,

      delete_profile,
    }
  }

  pub async fn prepare(&self) -> Result<()> {
    self.profile_by_user.prepare().await?;
    self.details_by_user.prepare().await?;

    self.get_profiles.prepare().await?;

    self.store_profile.prepare().await?;

    self.delete_profile.prepare().await?;

    Ok(())
  }

  pub async fn get_by_user(&self, user_id: Uuid) -> Result<Option<Profile>> {
    let row = self.profile_by_user.query_opt(&[&user_id]).await?;
    Ok(row.as_ref().map(profile_from_row))
  }

  pub async fn get_details_by_user(&self, user_id: Uuid) -> Result<Option<ProfileDetails>> {
    let row = self.details_by_user.query_opt(&[&user_id]).await?;
    Ok(row.as_ref().map(profile_details_from_row))
  }

  pub async fn get_profiles(&self) -> Result<Vec<ProfileDetails>> {
    let rows = self.get_profiles.query(&[]).await?;
    Ok(rows.iter().map(profile_details_from_row).collect())
  }

  pub async fn store(&self, profile: &Profile) -> Result<()> {
    self.store_profile.execute(&[&profile.user_id, &Json(profile)]).await?;
    Ok(())
  }

  pub async fn delete_by_user(&self, user_id: Uuid) -> Result<u64> {
    self.delete_profile.execute(&[&user_id]).await
  }
}
