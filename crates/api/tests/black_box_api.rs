use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use quorum_api::app::{build_app, services::ServiceRegistry};
use quorum_api::config::AppConfig;
use quorum_auth::{AccessClaims, Principal, Role};
use quorum_core::UserId;

const TEST_SIGNING_KEY: &str = "test-signing-key";

struct TestServer {
    base_url: String,
    registry: Arc<ServiceRegistry>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let config = AppConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            signing_key: TEST_SIGNING_KEY.to_string(),
            hash_cost: 4,
            token_ttl_min: 10,
            roles: AppConfig::default_roles(),
        };
        let registry =
            Arc::new(ServiceRegistry::new(config).expect("failed to boot service registry"));

        // Same router as prod, bound to an ephemeral port.
        let app = build_app(registry.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            registry,
            handle,
        }
    }

    /// Insert an admin directly into the store; registration only ever
    /// assigns the default role.
    fn seed_admin(&self, email: &str, password: &str) {
        let now = Utc::now();
        let hash = self
            .registry
            .crypto()
            .hash(password)
            .expect("failed to hash seed password");
        self.registry
            .users()
            .insert(Principal {
                id: UserId::new(),
                email: email.to_string(),
                display_name: "Admin".to_string(),
                secret_hash: hash,
                role: Role::new("admin"),
                created_at: now,
                updated_at: now,
            })
            .expect("failed to seed admin");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_token(signing_key: &str, subject: UserId, expires_at: chrono::DateTime<Utc>) -> String {
    let now = Utc::now();
    let claims = AccessClaims {
        sub: subject,
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key.as_bytes()),
    )
    .expect("failed to encode token")
}

async fn register(
    client: &reqwest::Client,
    base_url: &str,
    email: &str,
    name: &str,
    password: &str,
) -> reqwest::Response {
    client
        .post(format!("{}/auth/register", base_url))
        .json(&json!({ "email": email, "name": name, "password": password }))
        .send()
        .await
        .unwrap()
}

async fn login(client: &reqwest::Client, base_url: &str, email: &str, password: &str) -> String {
    let res = client
        .post(format!("{}/auth/login", base_url))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["token_type"], "Bearer");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_login_and_get_me() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = register(&client, &srv.base_url, "ada@example.com", "Ada", "s3cretpass").await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let token = login(&client, &srv.base_url, "ada@example.com", "s3cretpass").await;

    let res = client
        .get(format!("{}/users/me", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["role"], "member");
    assert!(body["user"].get("secret_hash").is_none());
}

#[tokio::test]
async fn get_me_falls_back_to_body_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    register(&client, &srv.base_url, "bob@example.com", "Bob", "s3cretpass").await;
    let token = login(&client, &srv.base_url, "bob@example.com", "s3cretpass").await;

    // No Authorization header; the token travels in the body instead.
    let res = client
        .get(format!("{}/users/me", srv.base_url))
        .json(&json!({ "token": token }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user"]["email"], "bob@example.com");
}

#[tokio::test]
async fn header_token_wins_over_body_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    register(&client, &srv.base_url, "one@example.com", "One", "s3cretpass").await;
    register(&client, &srv.base_url, "two@example.com", "Two", "s3cretpass").await;
    let header_token = login(&client, &srv.base_url, "one@example.com", "s3cretpass").await;
    let body_token = login(&client, &srv.base_url, "two@example.com", "s3cretpass").await;

    let res = client
        .get(format!("{}/users/me", srv.base_url))
        .bearer_auth(&header_token)
        .json(&json!({ "token": body_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user"]["email"], "one@example.com");
}

#[tokio::test]
async fn protected_endpoints_reject_missing_credentials() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .patch(format!("{}/users/me", srv.base_url))
        .json(&json!({ "name": "Nobody" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthenticated");
}

#[tokio::test]
async fn forged_token_is_unauthenticated() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let token = mint_token("wrong-key", UserId::new(), Utc::now() + ChronoDuration::minutes(10));
    let res = client
        .get(format!("{}/users/me", srv.base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthenticated");
}

#[tokio::test]
async fn expired_token_is_reported_distinctly() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = register(&client, &srv.base_url, "eve@example.com", "Eve", "s3cretpass").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let id: UserId = body["id"].as_str().unwrap().parse().unwrap();

    let token = mint_token(TEST_SIGNING_KEY, id, Utc::now() - ChronoDuration::minutes(1));
    let res = client
        .get(format!("{}/users/me", srv.base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "token_expired");
}

#[tokio::test]
async fn registration_validates_fields() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = register(&client, &srv.base_url, "not-an-email", "Ada", "s3cretpass").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = register(&client, &srv.base_url, "ok@example.com", "Al", "s3cretpass").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = register(&client, &srv.base_url, "ok@example.com", "Alice", "short").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = register(&client, &srv.base_url, "dup@example.com", "Dup", "s3cretpass").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let res = register(&client, &srv.base_url, "dup@example.com", "Dup", "s3cretpass").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn wrong_password_is_rejected_uniformly() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    register(&client, &srv.base_url, "kim@example.com", "Kim", "s3cretpass").await;

    for (email, password) in [
        ("kim@example.com", "wrong-password"),
        ("missing@example.com", "s3cretpass"),
    ] {
        let res = client
            .post(format!("{}/auth/login", srv.base_url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "invalid_credentials");
    }
}

#[tokio::test]
async fn poll_lifecycle_with_capability_checks() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    register(&client, &srv.base_url, "m@example.com", "Member", "s3cretpass").await;
    let member = login(&client, &srv.base_url, "m@example.com", "s3cretpass").await;
    srv.seed_admin("root@example.com", "s3cretpass");
    let admin = login(&client, &srv.base_url, "root@example.com", "s3cretpass").await;

    // Members can create polls.
    let res = client
        .post(format!("{}/polls", srv.base_url))
        .bearer_auth(&member)
        .json(&json!({ "question": "Tabs or spaces?", "options": ["tabs", "spaces"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let poll_id = body["poll"]["id"].as_str().unwrap().to_string();

    // Anyone can read them.
    let res = reqwest::get(format!("{}/polls/{}", srv.base_url, poll_id))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Voting again moves the vote.
    for option in [0, 1] {
        let res = client
            .post(format!("{}/polls/{}/vote", srv.base_url, poll_id))
            .bearer_auth(&member)
            .json(&json!({ "option": option }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
    let res = reqwest::get(format!("{}/polls/{}", srv.base_url, poll_id))
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["poll"]["options"][0]["voters"].as_array().unwrap().len(), 0);
    assert_eq!(body["poll"]["options"][1]["voters"].as_array().unwrap().len(), 1);

    // Out-of-range option is a validation error.
    let res = client
        .post(format!("{}/polls/{}/vote", srv.base_url, poll_id))
        .bearer_auth(&member)
        .json(&json!({ "option": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Members lack polls.delete; the distinct 403 means they authenticated.
    let res = client
        .delete(format!("{}/polls/{}", srv.base_url, poll_id))
        .bearer_auth(&member)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");

    // The admin wildcard grants everything.
    let res = client
        .delete(format!("{}/polls/{}", srv.base_url, poll_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = reqwest::get(format!("{}/polls/{}", srv.base_url, poll_id))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comments_follow_their_poll() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    register(&client, &srv.base_url, "c@example.com", "Carol", "s3cretpass").await;
    let member = login(&client, &srv.base_url, "c@example.com", "s3cretpass").await;
    srv.seed_admin("root@example.com", "s3cretpass");
    let admin = login(&client, &srv.base_url, "root@example.com", "s3cretpass").await;

    let res = client
        .post(format!("{}/polls", srv.base_url))
        .bearer_auth(&member)
        .json(&json!({ "question": "Lunch?", "options": ["yes", "no"] }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let poll_id = body["poll"]["id"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/polls/{}/comments", srv.base_url, poll_id))
        .bearer_auth(&member)
        .json(&json!({ "body": "count me in" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let comment_id = body["comment"]["id"].as_str().unwrap().to_string();

    // Reading comments is public.
    let res = reqwest::get(format!("{}/polls/{}/comments", srv.base_url, poll_id))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["comments"].as_array().unwrap().len(), 1);

    // Members lack comments.delete.
    let res = client
        .delete(format!(
            "{}/polls/{}/comments/{}",
            srv.base_url, poll_id, comment_id
        ))
        .bearer_auth(&member)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Deleting the poll cascades to its comments.
    let res = client
        .delete(format!("{}/polls/{}", srv.base_url, poll_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = reqwest::get(format!("{}/polls/{}/comments", srv.base_url, poll_id))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn members_can_update_their_own_profile() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    register(&client, &srv.base_url, "pat@example.com", "Pat", "s3cretpass").await;
    let token = login(&client, &srv.base_url, "pat@example.com", "s3cretpass").await;

    let res = client
        .patch(format!("{}/users/me", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Patricia", "password": "new-s3cret-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user"]["display_name"], "Patricia");

    // The old password stops working, the new one logs in.
    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "pat@example.com", "password": "s3cretpass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    login(&client, &srv.base_url, "pat@example.com", "new-s3cret-pass").await;
}

#[tokio::test]
async fn user_administration_requires_capabilities() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    register(&client, &srv.base_url, "m@example.com", "Member", "s3cretpass").await;
    let member = login(&client, &srv.base_url, "m@example.com", "s3cretpass").await;
    srv.seed_admin("root@example.com", "s3cretpass");
    let admin = login(&client, &srv.base_url, "root@example.com", "s3cretpass").await;

    let res = client
        .get(format!("{}/users", srv.base_url))
        .bearer_auth(&member)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(format!("{}/users", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);

    let member_id = users
        .iter()
        .find(|u| u["email"] == "m@example.com")
        .and_then(|u| u["id"].as_str())
        .unwrap()
        .to_string();

    // Full replacement via PUT.
    let res = client
        .put(format!("{}/users/{}", srv.base_url, member_id))
        .bearer_auth(&admin)
        .json(&json!({
            "email": "renamed@example.com",
            "name": "Renamed",
            "password": "another-pass"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user"]["email"], "renamed@example.com");

    let res = client
        .delete(format!("{}/users/{}", srv.base_url, member_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // The deleted principal's token no longer authenticates.
    let res = client
        .get(format!("{}/users/me", srv.base_url))
        .bearer_auth(&member)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_ids_are_rejected_before_lookup() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.seed_admin("root@example.com", "s3cretpass");
    let admin = login(&client, &srv.base_url, "root@example.com", "s3cretpass").await;

    let res = client
        .get(format!("{}/users/not-a-uuid", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");

    let res = reqwest::get(format!("{}/polls/not-a-uuid", srv.base_url))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
