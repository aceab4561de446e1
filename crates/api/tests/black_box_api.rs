use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use taskdesk_api::app::services::AppServices;
use taskdesk_auth::{AccessClaims, PasswordHasher, Role};
use taskdesk_core::UserId;
use taskdesk_infra::UserStore;
use taskdesk_users::{NewUser, User};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    services: Arc<AppServices>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, but with in-memory stores on an ephemeral port.
        let services = Arc::new(AppServices::in_memory(JWT_SECRET.as_bytes()));
        let app = taskdesk_api::app::build_app_with_services(services.clone());

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
            services,
            handle,
        }
    }

    /// Seed a user straight into the store and mint a token for it.
    async fn seed_user(&self, email: &str, role: Role) -> (User, String) {
        let password_hash = self.services.hasher.hash("password123").unwrap();
        let user = User::create(
            NewUser {
                email: email.to_string(),
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                role,
                password_hash,
            },
            Utc::now(),
        );
        let user = self.services.users.save(user).await.unwrap();
        let token = self
            .services
            .tokens
            .issue(user.id, user.role, Utc::now())
            .unwrap();
        (user, token)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn create_task(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    title: &str,
    assigned_to: UserId,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/tasks", base_url))
        .bearer_auth(token)
        .json(&json!({
            "title": title,
            "description": "integration test task",
            "assignedTo": assigned_to.to_string(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;

    let res = reqwest::Client::new()
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/tasks", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_wrong_secret_is_rejected() {
    let srv = TestServer::spawn().await;

    let now = Utc::now();
    let claims = AccessClaims {
        sub: UserId::new(),
        role: Role::Admin,
        issued_at: now,
        expires_at: now + ChronoDuration::hours(1),
    };
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"some-other-secret"),
    )
    .unwrap();

    let res = reqwest::Client::new()
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_returns_token_and_redacted_user() {
    let srv = TestServer::spawn().await;
    let (user, _) = srv.seed_user("login@example.com", Role::User).await;

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "login@example.com", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();

    assert_eq!(body["user"]["id"].as_str().unwrap(), user.id.to_string());
    assert_eq!(body["user"]["role"], "USER");
    assert!(body["user"].get("passwordHash").is_none());

    // The minted token works against a protected route.
    let token = body["access_token"].as_str().unwrap();
    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Wrong password is a 401, not a 403/404.
    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "login@example.com", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn task_access_policy_end_to_end() {
    let srv = TestServer::spawn().await;
    let (creator, creator_token) = srv.seed_user("creator@example.com", Role::User).await;
    let (assignee, assignee_token) = srv.seed_user("assignee@example.com", Role::User).await;
    let (_, outsider_token) = srv.seed_user("outsider@example.com", Role::User).await;
    let (_, admin_token) = srv.seed_user("admin@example.com", Role::Admin).await;

    let client = reqwest::Client::new();
    let task = create_task(&client, &srv.base_url, &creator_token, "Review PR", assignee.id).await;
    let task_id = task["id"].as_str().unwrap().to_string();
    assert_eq!(task["creator"]["id"].as_str().unwrap(), creator.id.to_string());
    assert_eq!(task["assignee"]["id"].as_str().unwrap(), assignee.id.to_string());

    // Assignee and admin can view; an unrelated user gets 403 (not 404).
    for token in [&assignee_token, &admin_token] {
        let res = client
            .get(format!("{}/tasks/{}", srv.base_url, task_id))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
    let res = client
        .get(format!("{}/tasks/{}", srv.base_url, task_id))
        .bearer_auth(&outsider_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Access denied");

    // The assignee can modify but not delete.
    let res = client
        .delete(format!("{}/tasks/{}", srv.base_url, task_id))
        .bearer_auth(&assignee_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Only task creators or admins can delete tasks");

    // The creator can delete; afterwards the id is gone.
    let res = client
        .delete(format!("{}/tasks/{}", srv.base_url, task_id))
        .bearer_auth(&creator_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/tasks/{}", srv.base_url, task_id))
        .bearer_auth(&creator_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn completing_a_task_stamps_completed_at_once() {
    let srv = TestServer::spawn().await;
    let (me, token) = srv.seed_user("worker@example.com", Role::User).await;

    let client = reqwest::Client::new();
    let task = create_task(&client, &srv.base_url, &token, "Ship it", me.id).await;
    let task_id = task["id"].as_str().unwrap().to_string();
    assert!(task["completedAt"].is_null());

    let res = client
        .patch(format!("{}/tasks/{}", srv.base_url, task_id))
        .bearer_auth(&token)
        .json(&json!({ "status": "COMPLETED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let completed: serde_json::Value = res.json().await.unwrap();
    let stamp = completed["completedAt"].as_str().unwrap().to_string();

    // Reopening keeps the original completion stamp.
    let res = client
        .patch(format!("{}/tasks/{}", srv.base_url, task_id))
        .bearer_auth(&token)
        .json(&json!({ "status": "TODO" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let reopened: serde_json::Value = res.json().await.unwrap();
    assert_eq!(reopened["status"], "TODO");
    assert_eq!(reopened["completedAt"].as_str().unwrap(), stamp);
}

#[tokio::test]
async fn listing_paginates_and_respects_visibility() {
    let srv = TestServer::spawn().await;
    let (me, my_token) = srv.seed_user("listing@example.com", Role::User).await;
    let (_, other_token) = srv.seed_user("other@example.com", Role::User).await;

    let client = reqwest::Client::new();
    for i in 0..23 {
        create_task(&client, &srv.base_url, &my_token, &format!("task {i}"), me.id).await;
    }

    let res = client
        .get(format!("{}/tasks?page=3&limit=10", srv.base_url))
        .bearer_auth(&my_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    assert_eq!(body["total"], 23);
    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["hasNextPage"], false);
    assert_eq!(body["hasPrevPage"], true);

    // Another non-admin sees none of them.
    let res = client
        .get(format!("{}/tasks", srv.base_url))
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["total"], 0);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    // Status filter is an exact-match conjunction with visibility.
    let res = client
        .get(format!("{}/tasks?status=COMPLETED", srv.base_url))
        .bearer_auth(&my_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["total"], 0);

    // Unknown status values are rejected, not ignored.
    let res = client
        .get(format!("{}/tasks?status=ARCHIVED", srv.base_url))
        .bearer_auth(&my_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn user_management_is_admin_only() {
    let srv = TestServer::spawn().await;
    let (_, admin_token) = srv.seed_user("root@example.com", Role::Admin).await;
    let (user, user_token) = srv.seed_user("plain@example.com", Role::User).await;

    let client = reqwest::Client::new();

    // Listing users requires the admin role.
    let res = client
        .get(format!("{}/users", srv.base_url))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(format!("{}/users", srv.base_url))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Any authenticated user can fetch a user by id; the hash never leaks.
    let res = client
        .get(format!("{}/users/{}", srv.base_url, user.id))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body.get("passwordHash").is_none());
    assert_eq!(body["email"], "plain@example.com");

    // Admin-created users must not collide on email.
    let res = client
        .post(format!("{}/users", srv.base_url))
        .bearer_auth(&admin_token)
        .json(&json!({
            "email": "plain@example.com",
            "password": "password123",
            "firstName": "Dup",
            "lastName": "Licate",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Validation failures report per-field messages.
    let res = client
        .post(format!("{}/users", srv.base_url))
        .bearer_auth(&admin_token)
        .json(&json!({
            "email": "not-an-email",
            "password": "tiny",
            "firstName": "",
            "lastName": "X",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
    assert!(fields.contains(&"firstName"));
}
