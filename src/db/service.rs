use log::*;

use std::ops::Deref;
use std::rc::Rc;
use std::cell::RefCell;
use std::time::Duration;

use async_trait::async_trait;

use tokio::time::sleep;

use tokio_postgres::{
  connect, Client, Statement, Row, NoTls,
  types::ToSql,
};

use uuid::Uuid;

use crate::error::*;
use crate::models::*;

use super::{
  MemoryStore,
  UserService,
  ProfileService,
  PostService,
};

const MAX_RETRIES: u32 = 10;

static SCHEMA: &str = include_str!("../../sql/schema.sql");

/// The three document collections: users, profiles and posts.
///
/// Writes are last-write-wins; there are no transactions or versioned
/// writes, so two concurrent read-modify-save cycles on one document can
/// lose an update.
#[async_trait(?Send)]
pub trait DocumentStore {
  /// Warm up the backend (connect, prepare statements).
  async fn prepare(&self) -> Result<()> {
    Ok(())
  }

  /// Create the collections if they don't exist.
  async fn migrate(&self) -> Result<()> {
    Ok(())
  }

  async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;
  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
  async fn insert_user(&self, user: &User) -> Result<()>;
  async fn update_password(&self, id: Uuid, password: &str) -> Result<u64>;
  async fn delete_user(&self, id: Uuid) -> Result<u64>;

  async fn find_profile_by_user(&self, user_id: Uuid) -> Result<Option<Profile>>;
  async fn profile_details_by_user(&self, user_id: Uuid) -> Result<Option<ProfileDetails>>;
  async fn list_profile_details(&self) -> Result<Vec<ProfileDetails>>;
  /// Insert or replace the profile of `profile.user_id`.
  async fn save_profile(&self, profile: &Profile) -> Result<()>;
  async fn delete_profile_by_user(&self, user_id: Uuid) -> Result<u64>;

  async fn find_post(&self, id: Uuid) -> Result<Option<Post>>;
  /// Newest first.
  async fn list_posts(&self) -> Result<Vec<Post>>;
  /// Insert or replace.
  async fn save_post(&self, post: &Post) -> Result<()>;
  async fn delete_post(&self, id: Uuid) -> Result<u64>;
  async fn delete_posts_by_user(&self, user_id: Uuid) -> Result<u64>;
}

pub type RefClient = Rc<(u64, Client)>;

/// Client connected state
#[derive(Clone)]
pub enum ClientState {
  Disconnected(u64),
  Connecting(u64),
  Connected(RefClient),
}

/// Wraps a postgres client with a version number.
/// Each time the client reconnects a new version number is generated.
pub struct VersionedClient {
  state: ClientState,
}

impl VersionedClient {
  pub fn new() -> Self {
    Self {
      state: ClientState::Disconnected(0),
    }
  }

  pub fn get_state(&self) -> &ClientState {
    &self.state
  }

  pub fn set_state(&mut self, state: ClientState) {
    self.state = state;
  }
}

/// A postgres client shared by the statements of one worker.
/// Wraps a `VersionedClient`
#[derive(Clone)]
pub struct SharedClient {
  cl: Rc<RefCell<VersionedClient>>,
}

impl SharedClient {
  pub fn new(url: &str) -> Self {
    Self {
      cl: Rc::new(RefCell::new(VersionedClient::new())),
    }.start_client(url.to_string())
  }

  fn start_client(self, url: String) -> Self {
    let shared_cl = self.clone();
    actix_rt::spawn(async move {
      shared_cl.spawn_client(url).await;
      debug!("client background task stopped.");
    });
    self
  }

  async fn spawn_client(&self, url: String) {
    let mut version = 0;
    debug!("Spawned client background task: ver={}", version);
    loop {
      version += 1;
      debug!("client task: Connecting: ver={}", version);
      self.change_inner_state(ClientState::Connecting(version));
      let (cl, conn) = loop {
        match connect(&url, NoTls).await {
          Ok((cl, conn)) => {
            debug!("client task: ver={}: connected.", version);
            break (cl, conn);
          },
          Err(e) => {
            warn!("client task: ver={}: connect error: {}", version, e);
            sleep(Duration::from_millis(500)).await;
          },
        }
      };
      debug!("client task: ver={}: Connecting -> Connected", version);
      self.change_inner_state(ClientState::Connected(
        Rc::new((version, cl))
      ));
      // Process background connection.
      match conn.await {
        Err(e) => {
          warn!("tokio-postgres connection error: {}", e);
        },
        _ => {
          debug!("tokio-postgres connection closed.");
          self.change_inner_state(ClientState::Disconnected(version));
          return;
        },
      }
      debug!("client task: ver={}: Connected -> Connecting", version);
      // wait a little bit before trying to connect.
      sleep(Duration::from_millis(500)).await;
    }
  }

  pub async fn get_client(&self) -> Result<RefClient> {
    let mut retries = 0u32;
    loop {
      match self.get_inner_state() {
        ClientState::Connected(cl) => return Ok(cl),
        ClientState::Connecting(version) => {
          debug!("get_client: ver={}: Connecting..", version);
          sleep(Duration::from_millis(100)).await;
        },
        ClientState::Disconnected(version) => {
          debug!("get_client: ver={}: Disconnected..", version);
          sleep(Duration::from_millis(100)).await;
        },
      }
      retries += 1;
      if retries >= MAX_RETRIES {
        return Err(Error::DisconnectedError("Failed to connect to database".to_string()));
      }
    }
  }

  /// Check client version.
  pub fn check_version(&self, version: u64) -> bool {
    match self.cl.borrow().get_state() {
      ClientState::Connected(ref cl) => cl.0 == version,
      _ => false,
    }
  }

  fn get_inner_state(&self) -> ClientState {
    self.cl.borrow().get_state().clone()
  }

  fn change_inner_state(&self, state: ClientState) {
    self.cl.borrow_mut().set_state(state)
  }
}

pub type RefClientStatement = Rc<ClientStatement>;
#[derive(Clone)]
pub struct ClientStatement {
  cl: RefClient,
  statement: Statement,
}

impl ClientStatement {
  pub fn get_version(&self) -> u64 {
    self.cl.0
  }

  pub fn get_cl_statement(&self) -> (&Client, &Statement) {
    (&self.cl.1, &self.statement)
  }
}

/// Prepare statement state
#[derive(Clone)]
enum StatementState {
  Init(u64),
  WaitingClient(u64),
  Preparing(u64),
  Prepared(RefClientStatement),
}

/// A prepared statement that is re-prepared whenever the shared client
/// reconnects.
#[derive(Clone)]
pub struct VersionedStatement {
  /// Shared Client, used for checking the version and reconnecting.
  shared_cl: SharedClient,

  /// Current version and statement state.
  state: Rc<RefCell<StatementState>>,

  /// Statement query
  query: String,
}

macro_rules! impl_client_method {
  ($method:ident, $res_ty:ty) => {
    pub async fn $method(&self, params: &[&(dyn ToSql + Sync)]) -> Result<$res_ty> {
      let mut retries = 0;
      loop {
        let ref_statement = self.get_statement().await?;
        let (cl, statement) = ref_statement.get_cl_statement();

        match cl.$method(statement, params).await {
          Ok(res) => return Ok(res),
          Err(err) if err.is_closed() => {
            retries += 1;
            if retries >= MAX_RETRIES {
              return Err(Error::DisconnectedError(
                "Failed to connect to database".to_string()));
            }
            // connection to the DB was closed, try again.
            info!("DB connection closed, retry query.");
            sleep(Duration::from_millis(100)).await;
          },
          Err(err) => {
            error!("Postgres error: {:?}, query=[[{}]]", err, self.query);
            return Err(err.into());
          },
        }
      }
    }
  };
}

impl VersionedStatement {
  pub fn new(shared_cl: SharedClient, query: &str) -> Self {
    Self {
      shared_cl,
      state: Rc::new(RefCell::new(StatementState::Init(0))),
      query: query.to_string(),
    }
  }

  pub async fn prepare(&self) -> Result<()> {
    self.get_statement().await?;
    Ok(())
  }

  pub async fn get_statement(&self) -> Result<RefClientStatement> {
    let mut retries = 0u32;
    loop {
      match self.get_state() {
        StatementState::Init(version) => {
          debug!("get_statement: ver={}: Init -> WaitingClient. Get client", version);
          self.set_state(StatementState::WaitingClient(version));
          let cl = match self.shared_cl.get_client().await {
            Ok(cl) => cl,
            Err(err) => {
              debug!("get_statement: ver={}: Init error: {:?}", version, err);
              // Failed to get client connection.  Go back into Init state.
              self.set_state(StatementState::Init(version));
              return Err(err);
            },
          };
          let version = cl.0;
          debug!("get_statement: ver={}: WaitingClient -> Preparing. Got client", version);
          self.set_state(StatementState::Preparing(version));
          match cl.1.prepare(&self.query).await {
            Ok(statement) => {
              debug!("get_statement: ver={}: Preparing -> Prepared. Got statement", version);
              self.set_state(StatementState::Prepared(
                Rc::new(ClientStatement{
                  cl,
                  statement,
                })
              ));
            },
            Err(err) if err.is_closed() => {
              // retry connection.  Go back into Init state.
              self.set_state(StatementState::Init(version));
            },
            Err(err) => {
              error!("Postgres error: {}, query=[[{}]]", err, self.query);
              self.set_state(StatementState::Init(version));
              return Err(err.into());
            },
          }
        },
        StatementState::WaitingClient(version) => {
          debug!("get_statement: ver={}: WaitingClient..", version);
          sleep(Duration::from_millis(100)).await;
        },
        StatementState::Preparing(version) => {
          debug!("get_statement: ver={}: Preparing..", version);
          sleep(Duration::from_millis(100)).await;
        },
        StatementState::Prepared(cl_statement) => {
          let version = cl_statement.get_version();
          if self.shared_cl.check_version(version) {
            return Ok(cl_statement);
          }
          debug!("get_statement: ver={}: stale statement, prepare again", version);
          self.set_state(StatementState::Init(version));
        },
      }
      retries += 1;
      if retries >= MAX_RETRIES {
        return Err(Error::DisconnectedError("Failed to connect to database".to_string()));
      }
    }
  }

  fn get_state(&self) -> StatementState {
    self.state.borrow().clone()
  }

  fn set_state(&self, state: StatementState) {
    self.state.replace(state);
  }

  impl_client_method!(query, Vec<Row>);
  impl_client_method!(query_opt, Option<Row>);
  impl_client_method!(execute, u64);
}

/// PostgreSQL backend.  Documents live in `jsonb` columns next to the keys
/// they are looked up by.
#[derive(Clone)]
pub struct PgStore {
  pub shared_cl: SharedClient,
  pub user: UserService,
  pub profile: ProfileService,
  pub post: PostService,
}

impl PgStore {
  pub fn new(db_url: &str) -> PgStore {
    let shared_cl = SharedClient::new(db_url);

    PgStore {
      user: UserService::new(shared_cl.clone()),
      profile: ProfileService::new(shared_cl.clone()),
      post: PostService::new(shared_cl.clone()),
      shared_cl,
    }
  }
}

#[async_trait(?Send)]
impl DocumentStore for PgStore {
  async fn prepare(&self) -> Result<()> {
    info!("DBService: Prepare UserService.");
    self.user.prepare().await?;
    info!("DBService: Prepare ProfileService.");
    self.profile.prepare().await?;
    info!("DBService: Prepare PostService.");
    self.post.prepare().await?;

    info!("DBService: finished.");
    Ok(())
  }

  async fn migrate(&self) -> Result<()> {
    let cl = self.shared_cl.get_client().await?;
    cl.1.batch_execute(SCHEMA).await?;
    info!("DBService: schema applied.");
    Ok(())
  }

  async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
    self.user.get_by_id(id).await
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    self.user.get_by_email(email).await
  }

  async fn insert_user(&self, user: &User) -> Result<()> {
    self.user.store(user).await
  }

  async fn update_password(&self, id: Uuid, password: &str) -> Result<u64> {
    self.user.update_password(id, password).await
  }

  async fn delete_user(&self, id: Uuid) -> Result<u64> {
    self.user.delete(id).await
  }

  async fn find_profile_by_user(&self, user_id: Uuid) -> Result<Option<Profile>> {
    self.profile.get_by_user(user_id).await
  }

  async fn profile_details_by_user(&self, user_id: Uuid) -> Result<Option<ProfileDetails>> {
    self.profile.get_details_by_user(user_id).await
  }

  async fn list_profile_details(&self) -> Result<Vec<ProfileDetails>> {
    self.profile.get_profiles().await
  }

  async fn save_profile(&self, profile: &Profile) -> Result<()> {
    self.profile.store(profile).await
  }

  async fn delete_profile_by_user(&self, user_id: Uuid) -> Result<u64> {
    self.profile.delete_by_user(user_id).await
  }

  async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
    self.post.get_by_id(id).await
  }

  async fn list_posts(&self) -> Result<Vec<Post>> {
    self.post.get_posts().await
  }

  async fn save_post(&self, post: &Post) -> Result<()> {
    self.post.store(post).await
  }

  async fn delete_post(&self, id: Uuid) -> Result<u64> {
    self.post.delete(id).await
  }

  async fn delete_posts_by_user(&self, user_id: Uuid) -> Result<u64> {
    self.post.delete_by_user(user_id).await
  }
}

/// Which backend a worker's `DbService` talks to.
#[derive(Clone)]
pub enum StoreConfig {
  Postgres(String),
  /// Shared by all workers.
  Memory(MemoryStore),
}

impl StoreConfig {
  pub fn from_url(url: &str) -> Self {
    if url.starts_with("memory:") {
      StoreConfig::Memory(MemoryStore::new())
    } else {
      StoreConfig::Postgres(url.to_string())
    }
  }
}

/// Per-worker handle on the document store.
#[derive(Clone)]
pub struct DbService {
  store: Rc<dyn DocumentStore>,
}

impl DbService {
  pub fn new(config: &StoreConfig) -> DbService {
    match config {
      StoreConfig::Postgres(url) => Self::from_store(PgStore::new(url)),
      StoreConfig::Memory(store) => Self::from_store(store.clone()),
    }
  }

  pub fn from_store<S: DocumentStore + 'static>(store: S) -> DbService {
    DbService {
      store: Rc::new(store),
    }
  }

  /// Insert a new user.  Losing a race on the email is reported like any
  /// other duplicate registration.
  pub async fn register_user(&self, user: &User) -> Result<()> {
    if let Err(err) = self.store.insert_user(user).await {
      if self.store.find_user_by_email(&user.email).await?.is_some() {
        debug!("register {}: email taken: {}", user.id, err);
        return Err(Error::rejected("User already exists"));
      }
      return Err(err);
    }
    Ok(())
  }

  /// Remove a user together with their profile and posts.
  pub async fn delete_account(&self, user_id: Uuid) -> Result<()> {
    let posts = self.store.delete_posts_by_user(user_id).await?;
    let profiles = self.store.delete_profile_by_user(user_id).await?;
    let users = self.store.delete_user(user_id).await?;
    info!("Deleted account {}: users={}, profiles={}, posts={}", user_id, users, profiles, posts);
    Ok(())
  }
}

impl Deref for DbService {
  type Target = dyn DocumentStore;

  fn deref(&self) -> &Self::Target {
    &*self.store
  }
}
