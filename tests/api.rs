use actix_web::{http::StatusCode, test, App};

use pretty_assertions::assert_eq;

use serde_json::{json, Value as JsonValue};

use devconnector::app::AppConfig;
use devconnector::services::config_services;

const SERVICES: &str = r#"["User", "Auth", "Profile", "Post"]"#;

const NO_SERVER: &str = "http://127.0.0.1:9";

/// Test config, with `extra` appended as more toml tables.
fn test_config(github_url: &str, extra: &str) -> AppConfig {
  AppConfig::from_toml(&format!(r#"
    [api]
    services = {}
    [db]
    url = "memory://"
    [auth]
    jwt_secret = "test-secret"
    token_hours = 1
    [github]
    api_url = "{}"
    {}
  "#, SERVICES, github_url, extra)).unwrap()
}

fn pusher_config(base_url: &str) -> String {
  format!(r#"
    [pusher]
    app_id = "1"
    key = "key"
    secret = "secret"
    base_url = "{}"
    channel = "posts"
  "#, base_url)
}

macro_rules! init_app {
  () => { init_app!(NO_SERVER) };
  ($github_url:expr) => { init_app!($github_url, "") };
  ($github_url:expr, $extra:expr) => {{
    let services = config_services(&test_config($github_url, &$extra), "api").unwrap();
    test::init_service(App::new().configure(move |web| services.web_config(web))).await
  }};
}

/// Send the request and return the status with the decoded JSON body.
macro_rules! send {
  ($app:expr, $req:expr) => {{
    let res = test::call_service(&$app, $req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    let json: JsonValue = if body.is_empty() {
      JsonValue::Null
    } else {
      serde_json::from_slice(&body).unwrap()
    };
    (status, json)
  }};
}

/// Register a user and return `(token, user id)`.
macro_rules! register {
  ($app:expr, $name:expr) => {{
    let (status, body) = send!($app, test::TestRequest::post()
      .uri("/api/users")
      .set_json(json!({
        "name": $name,
        "email": format!("{}@example.com", $name),
        "password": "password123",
        "passwordConfirm": "password123",
      })));
    assert_eq!(status, StatusCode::CREATED);
    let token = body["token"].as_str().unwrap().to_string();
    let (status, user) = send!($app, authed(test::TestRequest::get().uri("/api/auth"), &token));
    assert_eq!(status, StatusCode::OK);
    (token, user["_id"].as_str().unwrap().to_string())
  }};
}

fn authed(req: test::TestRequest, token: &str) -> test::TestRequest {
  req.insert_header(("Authorization", format!("Bearer {}", token)))
}

fn profile_body() -> JsonValue {
  json!({
    "status": "Developer",
    "skills": "rust, actix ,, sql",
    "githubUsername": "octocat",
    "twitter": "https://twitter.com/ada",
  })
}

#[actix_rt::test]
async fn register_login_and_current_user() {
  let app = init_app!();
  let (token, id) = register!(app, "ada");

  let (status, user) = send!(app, authed(test::TestRequest::get().uri("/api/auth"), &token));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(user["_id"], json!(id));
  assert_eq!(user["name"], json!("ada"));
  assert_eq!(user["email"], json!("ada@example.com"));
  assert!(user["avatar"].as_str().unwrap().starts_with("https://www.gravatar.com/avatar/"));
  assert!(user.get("password").is_none());

  // the legacy header works too
  let (status, _) = send!(app, test::TestRequest::get()
    .uri("/api/auth")
    .insert_header(("x-auth-token", token.as_str())));
  assert_eq!(status, StatusCode::OK);

  let (status, body) = send!(app, test::TestRequest::post()
    .uri("/api/users")
    .set_json(json!({
      "name": "Ada again",
      "email": "ADA@example.com",
      "password": "password123",
    })));
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body, json!({ "errors": [{ "msg": "User already exists" }] }));

  let (status, body) = send!(app, test::TestRequest::post()
    .uri("/api/auth")
    .set_json(json!({ "email": "ada@example.com", "password": "wrong-password" })));
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body, json!({ "errors": [{ "msg": "Invalid credentials" }] }));

  let (status, body) = send!(app, test::TestRequest::post()
    .uri("/api/auth")
    .set_json(json!({ "email": "nobody@example.com", "password": "password123" })));
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body, json!({ "errors": [{ "msg": "Invalid credentials" }] }));

  let (status, body) = send!(app, test::TestRequest::post()
    .uri("/api/auth")
    .set_json(json!({ "email": "ada@example.com", "password": "password123" })));
  assert_eq!(status, StatusCode::OK);
  assert!(body["token"].is_string());
}

#[actix_rt::test]
async fn register_reports_every_invalid_field() {
  let app = init_app!();
  let (status, body) = send!(app, test::TestRequest::post()
    .uri("/api/users")
    .set_json(json!({
      "email": "not-an-email",
      "password": "short",
      "passwordConfirm": "shorter",
    })));
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let params: Vec<&str> = body["errors"].as_array().unwrap().iter()
    .map(|e| e["param"].as_str().unwrap())
    .collect();
  assert_eq!(params, vec!["name", "email", "password", "passwordConfirm"]);
  assert!(body["errors"].as_array().unwrap().iter().all(|e| e["location"] == json!("body")));
}

#[actix_rt::test]
async fn malformed_json_is_a_bad_request() {
  let app = init_app!();
  let (status, body) = send!(app, test::TestRequest::post()
    .uri("/api/users")
    .insert_header(("content-type", "application/json"))
    .set_payload("{ not json"));
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["msg"].is_string());
}

#[actix_rt::test]
async fn protected_routes_need_a_valid_token() {
  let app = init_app!();

  let (status, body) = send!(app, test::TestRequest::get().uri("/api/posts"));
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body, json!({ "msg": "No token, authorization denied" }));

  let (status, body) = send!(app, authed(test::TestRequest::get().uri("/api/profile/me"), "garbage"));
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body, json!({ "msg": "Token is not valid" }));

  // public routes
  let (status, body) = send!(app, test::TestRequest::get().uri("/api/profile"));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!([]));
}

#[actix_rt::test]
async fn profile_is_created_then_updated_in_place() {
  let app = init_app!();
  let (token, user_id) = register!(app, "ada");

  let (status, body) = send!(app, authed(test::TestRequest::get().uri("/api/profile/me"), &token));
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body, json!({ "msg": "There is no profile for this user" }));

  let (status, body) = send!(app, authed(test::TestRequest::post().uri("/api/profile"), &token)
    .set_json(json!({ "company": "Acme" })));
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["errors"].as_array().unwrap().len(), 2);

  let (status, created) = send!(app, authed(test::TestRequest::post().uri("/api/profile"), &token)
    .set_json(profile_body()));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(created["skills"], json!(["rust", "actix", "sql"]));
  assert_eq!(created["githubUsername"], json!("octocat"));
  assert_eq!(created["social"], json!({ "twitter": "https://twitter.com/ada" }));
  assert_eq!(created["user"]["_id"], json!(user_id));
  assert_eq!(created["user"]["name"], json!("ada"));

  let (status, updated) = send!(app, authed(test::TestRequest::post().uri("/api/profile"), &token)
    .set_json(json!({ "status": "Senior Developer", "skills": "rust", "company": "Acme" })));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["_id"], created["_id"]);
  assert_eq!(updated["status"], json!("Senior Developer"));
  assert_eq!(updated["company"], json!("Acme"));
  assert_eq!(updated["githubUsername"], json!("octocat"));
  assert_eq!(updated["social"], json!({}));

  let (status, list) = send!(app, test::TestRequest::get().uri("/api/profile"));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(list.as_array().unwrap().len(), 1);

  let (status, found) = send!(app, test::TestRequest::get().uri(&format!("/api/profile/user/{}", user_id)));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(found, updated);

  let (status, body) = send!(app, test::TestRequest::get().uri("/api/profile/user/5d7a514b5d2c12c7449be042"));
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body, json!({ "msg": "No profile for that user" }));
}

#[actix_rt::test]
async fn experience_and_education_lists() {
  let app = init_app!();
  let (token, _) = register!(app, "ada");

  let experience = json!({ "title": "Engineer", "company": "Acme", "from": "2019-05-01", "current": true });
  let (status, body) = send!(app, authed(test::TestRequest::patch().uri("/api/profile/experience"), &token)
    .set_json(&experience));
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body, json!({ "msg": "There is no profile for this user" }));

  send!(app, authed(test::TestRequest::post().uri("/api/profile"), &token).set_json(profile_body()));

  let (status, body) = send!(app, authed(test::TestRequest::patch().uri("/api/profile/experience"), &token)
    .set_json(json!({ "title": "Engineer", "from": "someday" })));
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let params: Vec<&str> = body["errors"].as_array().unwrap().iter()
    .map(|e| e["param"].as_str().unwrap())
    .collect();
  assert_eq!(params, vec!["company", "from"]);

  send!(app, authed(test::TestRequest::patch().uri("/api/profile/experience"), &token)
    .set_json(&experience));
  let (status, profile) = send!(app, authed(test::TestRequest::patch().uri("/api/profile/experience"), &token)
    .set_json(json!({ "title": "Lead", "company": "Initech", "from": "2021-01-01" })));
  assert_eq!(status, StatusCode::OK);
  let list = profile["experience"].as_array().unwrap();
  assert_eq!(list.len(), 2);
  assert_eq!(list[0]["title"], json!("Lead"));
  assert_eq!(list[1]["from"], json!("2019-05-01"));

  let exp_id = list[1]["_id"].as_str().unwrap().to_string();
  let uri = format!("/api/profile/experience/{}", exp_id);
  let (status, profile) = send!(app, authed(test::TestRequest::delete().uri(&uri), &token));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(profile["experience"].as_array().unwrap().len(), 1);

  let (status, body) = send!(app, authed(test::TestRequest::delete().uri(&uri), &token));
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body, json!({ "msg": "Experience not found" }));

  let (status, profile) = send!(app, authed(test::TestRequest::patch().uri("/api/profile/education"), &token)
    .set_json(json!({
      "school": "MIT",
      "degree": "BSc",
      "fieldOfStudy": "CS",
      "from": "2010-09-01",
      "to": "2014-06-01",
    })));
  assert_eq!(status, StatusCode::OK);
  let edu_id = profile["education"][0]["_id"].as_str().unwrap().to_string();
  assert_eq!(profile["education"][0]["fieldOfStudy"], json!("CS"));

  let uri = format!("/api/profile/education/{}", edu_id);
  let (status, profile) = send!(app, authed(test::TestRequest::delete().uri(&uri), &token));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(profile["education"], json!([]));

  let (status, body) = send!(app, authed(test::TestRequest::delete().uri("/api/profile/education/nope"), &token));
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body, json!({ "msg": "Education not found" }));
}

#[actix_rt::test]
async fn likes_and_comments() {
  let app = init_app!();
  let (ada, ada_id) = register!(app, "ada");
  let (bob, bob_id) = register!(app, "bob");

  let (status, body) = send!(app, authed(test::TestRequest::post().uri("/api/posts"), &ada)
    .set_json(json!({ "text": "   " })));
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["errors"][0]["param"], json!("text"));

  let (status, post) = send!(app, authed(test::TestRequest::post().uri("/api/posts"), &ada)
    .set_json(json!({ "text": "Hello world" })));
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(post["user"], json!(ada_id));
  assert_eq!(post["name"], json!("ada"));
  assert_eq!(post["likes"], json!([]));
  let post_id = post["_id"].as_str().unwrap().to_string();

  let like_uri = format!("/api/posts/like/{}", post_id);
  let unlike_uri = format!("/api/posts/unlike/{}", post_id);

  let (status, likes) = send!(app, authed(test::TestRequest::put().uri(&like_uri), &bob));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(likes.as_array().unwrap().len(), 1);
  assert_eq!(likes[0]["user"], json!(bob_id));

  let (status, body) = send!(app, authed(test::TestRequest::put().uri(&like_uri), &bob));
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body, json!({ "msg": "Posts can be liked only once" }));

  let (status, likes) = send!(app, authed(test::TestRequest::put().uri(&unlike_uri), &bob));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(likes, json!([]));

  let (status, body) = send!(app, authed(test::TestRequest::put().uri(&unlike_uri), &bob));
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body, json!({ "msg": "Post has not yet been liked" }));

  let comment_uri = format!("/api/posts/comment/{}", post_id);
  let (status, comments) = send!(app, authed(test::TestRequest::post().uri(&comment_uri), &bob)
    .set_json(json!({ "text": "Nice post" })));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(comments[0]["name"], json!("bob"));
  let comment_id = comments[0]["_id"].as_str().unwrap().to_string();

  let delete_comment_uri = format!("/api/posts/comment/{}/{}", post_id, comment_id);
  let (status, body) = send!(app, authed(test::TestRequest::delete().uri(&delete_comment_uri), &ada));
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body, json!({ "msg": "User not authorized" }));

  let (status, comments) = send!(app, authed(test::TestRequest::delete().uri(&delete_comment_uri), &bob));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(comments, json!([]));

  let (status, body) = send!(app, authed(test::TestRequest::delete().uri(&delete_comment_uri), &bob));
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body, json!({ "msg": "Comment does not exist" }));
}

#[actix_rt::test]
async fn only_the_author_deletes_a_post() {
  let app = init_app!();
  let (ada, _) = register!(app, "ada");
  let (bob, _) = register!(app, "bob");

  let (_, first) = send!(app, authed(test::TestRequest::post().uri("/api/posts"), &ada)
    .set_json(json!({ "text": "first" })));
  let (_, second) = send!(app, authed(test::TestRequest::post().uri("/api/posts"), &ada)
    .set_json(json!({ "text": "second", "name": "Countess" })));
  assert_eq!(second["name"], json!("Countess"));

  let (status, posts) = send!(app, authed(test::TestRequest::get().uri("/api/posts"), &bob));
  assert_eq!(status, StatusCode::OK);
  let texts: Vec<&str> = posts.as_array().unwrap().iter()
    .map(|p| p["text"].as_str().unwrap())
    .collect();
  assert_eq!(texts, vec!["second", "first"]);

  let uri = format!("/api/posts/{}", first["_id"].as_str().unwrap());
  let (status, body) = send!(app, authed(test::TestRequest::delete().uri(&uri), &bob));
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body, json!({ "msg": "You can only delete your own posts" }));

  let (status, body) = send!(app, authed(test::TestRequest::delete().uri(&uri), &ada));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "msg": "Post successfully deleted" }));

  let (status, body) = send!(app, authed(test::TestRequest::get().uri(&uri), &ada));
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body, json!({ "msg": "Post not found" }));

  let (status, body) = send!(app, authed(test::TestRequest::get().uri("/api/posts/not-an-id"), &ada));
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body, json!({ "msg": "Post not found" }));
}

#[actix_rt::test]
async fn deleting_an_account_removes_its_documents() {
  let app = init_app!();
  let (ada, _) = register!(app, "ada");
  let (bob, _) = register!(app, "bob");

  send!(app, authed(test::TestRequest::post().uri("/api/profile"), &ada).set_json(profile_body()));
  send!(app, authed(test::TestRequest::post().uri("/api/profile"), &bob).set_json(profile_body()));
  send!(app, authed(test::TestRequest::post().uri("/api/posts"), &ada).set_json(json!({ "text": "bye" })));
  send!(app, authed(test::TestRequest::post().uri("/api/posts"), &bob).set_json(json!({ "text": "hi" })));

  let (status, body) = send!(app, authed(test::TestRequest::delete().uri("/api/profile"), &ada));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "msg": "User deleted from database" }));

  let (status, body) = send!(app, authed(test::TestRequest::get().uri("/api/auth"), &ada));
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body, json!({ "msg": "User not found" }));

  let (_, profiles) = send!(app, test::TestRequest::get().uri("/api/profile"));
  assert_eq!(profiles.as_array().unwrap().len(), 1);
  assert_eq!(profiles[0]["user"]["name"], json!("bob"));

  let (_, posts) = send!(app, authed(test::TestRequest::get().uri("/api/posts"), &bob));
  assert_eq!(posts.as_array().unwrap().len(), 1);
  assert_eq!(posts[0]["text"], json!("hi"));

  let (status, _) = send!(app, test::TestRequest::post()
    .uri("/api/auth")
    .set_json(json!({ "email": "ada@example.com", "password": "password123" })));
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn github_repos_are_proxied() {
  use wiremock::{Mock, MockServer, ResponseTemplate};
  use wiremock::matchers::{method, path};

  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/users/octocat/repos"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "name": "hello-world" }])))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/users/nobody/repos"))
    .respond_with(ResponseTemplate::new(404))
    .mount(&server)
    .await;

  let app = init_app!(&server.uri());

  let (status, repos) = send!(app, test::TestRequest::get().uri("/api/profile/github/octocat"));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(repos, json!([{ "name": "hello-world" }]));

  let (status, body) = send!(app, test::TestRequest::get().uri("/api/profile/github/nobody"));
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body, json!({ "msg": "Github profile not found" }));
}

#[actix_rt::test]
async fn register_rejects_passwords_outside_the_limits() {
  let app = init_app!();

  // 200 characters, and 8 as sent but 4 after unicode normalization.
  for password in ["a".repeat(200), "e\u{301}".repeat(4)] {
    let (status, body) = send!(app, test::TestRequest::post()
      .uri("/api/users")
      .set_json(json!({
        "name": "ada",
        "email": "ada@example.com",
        "password": password,
      })));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["param"], json!("password"));
  }

  // nothing was stored, so the email is still free.
  register!(app, "ada");
}

/// Wait for the spawned broadcast to reach the mock and return its body.
async fn received_trigger(server: &wiremock::MockServer, event: &str) -> JsonValue {
  for _ in 0..100 {
    let requests = server.received_requests().await.unwrap_or_default();
    let found = requests.iter()
      .filter_map(|req| serde_json::from_slice::<JsonValue>(&req.body).ok())
      .find(|body| body["name"] == json!(event));
    if let Some(body) = found {
      return body;
    }
    actix_rt::time::sleep(std::time::Duration::from_millis(20)).await;
  }
  panic!("no '{}' trigger received", event);
}

#[actix_rt::test]
async fn likes_are_broadcast_to_the_posts_channel() {
  use wiremock::{Mock, MockServer, ResponseTemplate};
  use wiremock::matchers::{method, path};

  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/apps/1/events"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
    .mount(&server)
    .await;

  let app = init_app!(NO_SERVER, pusher_config(&server.uri()));
  let (ada, _) = register!(app, "ada");
  let (bob, bob_id) = register!(app, "bob");

  let (status, post) = send!(app, authed(test::TestRequest::post().uri("/api/posts"), &ada)
    .set_json(json!({ "text": "Hello world" })));
  assert_eq!(status, StatusCode::CREATED);
  let post_id = post["_id"].as_str().unwrap().to_string();

  let (status, _) = send!(app, authed(
    test::TestRequest::put().uri(&format!("/api/posts/like/{}", post_id)), &bob));
  assert_eq!(status, StatusCode::OK);

  let trigger = received_trigger(&server, "update-likes").await;
  assert_eq!(trigger["channels"], json!(["posts"]));
  let data: JsonValue = serde_json::from_str(trigger["data"].as_str().unwrap()).unwrap();
  assert_eq!(data["id"], json!(post_id));
  assert_eq!(data["likes"].as_array().unwrap().len(), 1);
  assert_eq!(data["likes"][0]["user"], json!(bob_id));
}

#[actix_rt::test]
async fn failed_broadcasts_do_not_fail_the_request() {
  use wiremock::{Mock, MockServer, ResponseTemplate};
  use wiremock::matchers::{method, path};

  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/apps/1/events"))
    .respond_with(ResponseTemplate::new(500))
    .mount(&server)
    .await;

  let app = init_app!(NO_SERVER, pusher_config(&server.uri()));
  let (ada, _) = register!(app, "ada");
  let (bob, bob_id) = register!(app, "bob");

  let (status, post) = send!(app, authed(test::TestRequest::post().uri("/api/posts"), &ada)
    .set_json(json!({ "text": "Hello world" })));
  assert_eq!(status, StatusCode::CREATED);
  let post_id = post["_id"].as_str().unwrap().to_string();

  let (status, likes) = send!(app, authed(
    test::TestRequest::put().uri(&format!("/api/posts/like/{}", post_id)), &bob));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(likes[0]["user"], json!(bob_id));

  received_trigger(&server, "update-likes").await;

  // the post is still readable after the failed send.
  let (status, post) = send!(app, authed(
    test::TestRequest::get().uri(&format!("/api/posts/{}", post_id)), &bob));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(post["likes"].as_array().unwrap().len(), 1);
}
