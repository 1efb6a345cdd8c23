// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test harness: an in-process mock of the admin backend.

use admin_console::config::Config;
use admin_console::services::{ApiClient, MemoryNavigator, TokenStore};
use axum::extract::{Path, Query, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Password the mock login endpoint accepts.
#[allow(dead_code)]
pub const GOOD_PASSWORD: &str = "correct-horse";

const SIGNING_KEY: &[u8] = b"test_signing_key_32_bytes_long!!";

static NEXT_JTI: AtomicUsize = AtomicUsize::new(1);

/// Mint a signed token for `sub` with `role`, expiring `expires_in` seconds
/// from now (negative for already expired).
#[allow(dead_code)]
pub fn mint_token(sub: &str, role: &str, expires_in: i64) -> String {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp();
    let claims = json!({
        "sub": sub,
        "email": format!("{}@example.com", sub),
        "role": role,
        "firstName": "Test",
        "lastName": sub,
        "iat": now,
        "exp": now + expires_in,
        // Keeps tokens minted in the same second distinct.
        "jti": NEXT_JTI.fetch_add(1, Ordering::Relaxed),
    });

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SIGNING_KEY),
    )
    .expect("Failed to create token")
}

/// Knobs and counters shared with the mock routes.
pub struct MockState {
    /// Bearer token protected endpoints accept
    pub accepted: Mutex<String>,
    /// Token issued by login
    pub login_token: String,
    /// Token issued by the next successful refresh
    pub refreshed_token: String,
    /// Refresh answers 401 when set
    pub fail_refresh: AtomicBool,
    /// Refresh succeeds but protected endpoints keep rejecting
    pub reject_after_refresh: AtomicBool,
    /// Refresh holds its response until this many 401s have been served
    pub hold_refresh_until: AtomicUsize,
    /// Refresh stalls while set
    pub pause_refresh: AtomicBool,
    pub refresh_calls: AtomicUsize,
    pub unauthorized: AtomicUsize,
    /// Protected requests that succeeded with the refreshed token
    pub retried: AtomicUsize,
    pub logout_calls: AtomicUsize,
    /// Refresh request bodies, in arrival order
    pub refresh_bodies: Mutex<Vec<Value>>,
}

impl MockState {
    #[allow(dead_code)]
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    #[allow(dead_code)]
    pub fn unauthorized(&self) -> usize {
        self.unauthorized.load(Ordering::SeqCst)
    }

    #[allow(dead_code)]
    pub fn retried(&self) -> usize {
        self.retried.load(Ordering::SeqCst)
    }

    #[allow(dead_code)]
    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

/// Running mock backend.
pub struct MockBackend {
    pub url: String,
    pub state: Arc<MockState>,
    server: tokio::task::JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl MockBackend {
    /// Start a backend that accepts `accepted` on protected endpoints.
    pub async fn start(accepted: &str) -> Self {
        let state = Arc::new(MockState {
            accepted: Mutex::new(accepted.to_string()),
            login_token: mint_token("42", "admin", 3600),
            refreshed_token: mint_token("42", "admin", 7200),
            fail_refresh: AtomicBool::new(false),
            reject_after_refresh: AtomicBool::new(false),
            hold_refresh_until: AtomicUsize::new(0),
            pause_refresh: AtomicBool::new(false),
            refresh_calls: AtomicUsize::new(0),
            unauthorized: AtomicUsize::new(0),
            retried: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            refresh_bodies: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/auth/login", post(login))
            .route("/v1/auth/register", post(register))
            .route("/v1/auth/refresh", post(refresh))
            .route("/v1/auth/logout", post(logout))
            .route("/v1/dashboard/stats", get(stats))
            .route("/v1/dashboard/growth", get(growth))
            .route("/v1/dashboard/activity", get(activity))
            .route("/v1/users", get(list_users))
            .route("/v1/users/{id}", get(get_user).delete(delete_user))
            .route("/v1/users/{id}/status", patch(set_status))
            .route("/v1/slow", get(slow))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("No local address");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock backend failed");
        });

        Self {
            url: format!("http://{}", addr),
            state,
            server,
        }
    }

    #[allow(dead_code)]
    pub fn config(&self) -> Config {
        Config::test_default().with_api_url(&self.url)
    }

    /// Client over an in-memory store, starting at `location`.
    #[allow(dead_code)]
    pub fn client(&self, location: &str) -> (Arc<ApiClient>, Arc<MemoryNavigator>) {
        self.client_with(self.config(), TokenStore::in_memory(), location)
    }

    #[allow(dead_code)]
    pub fn client_with(
        &self,
        config: Config,
        store: TokenStore,
        location: &str,
    ) -> (Arc<ApiClient>, Arc<MemoryNavigator>) {
        let navigator = Arc::new(MemoryNavigator::new(location));
        let client = ApiClient::new(&config, store, navigator.clone())
            .expect("Failed to build client");
        (Arc::new(client), navigator)
    }
}

fn ok(data: Value) -> Response {
    Json(json!({ "success": true, "message": "", "data": data })).into_response()
}

fn fail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Gate for protected endpoints.
fn authorize(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    let accepted = state.accepted.lock().unwrap().clone();
    match bearer(headers) {
        Some(token) if token == accepted => {
            if token == state.refreshed_token {
                state.retried.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
        _ => {
            state.unauthorized.fetch_add(1, Ordering::SeqCst);
            Err(fail(StatusCode::UNAUTHORIZED, "Token expired"))
        }
    }
}

fn user_json(id: &str) -> Value {
    json!({
        "id": id,
        "email": format!("user{}@example.com", id),
        "firstName": "User",
        "lastName": id,
        "role": "user",
        "isActive": true,
        "createdAt": "2026-01-05T10:00:00Z",
        "lastLoginAt": null,
        "avatar": null,
    })
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    if body["password"] == GOOD_PASSWORD {
        ok(json!({ "token": state.login_token, "refreshToken": "refresh-1" }))
    } else {
        fail(StatusCode::UNAUTHORIZED, "Invalid email or password")
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["email"] == "taken@example.com" {
        return fail(StatusCode::CONFLICT, "User already exists");
    }
    let mut user = user_json("100");
    user["email"] = body["email"].clone();
    (StatusCode::CREATED, ok(user)).into_response()
}

async fn refresh(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    state.refresh_bodies.lock().unwrap().push(body);

    let hold = state.hold_refresh_until.load(Ordering::SeqCst);
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while state.unauthorized.load(Ordering::SeqCst) < hold && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    if hold > 0 {
        // Let the client see every 401 before the refresh resolves.
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    while state.pause_refresh.load(Ordering::SeqCst) && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    if state.fail_refresh.load(Ordering::SeqCst) {
        return fail(StatusCode::UNAUTHORIZED, "Refresh token expired");
    }

    if !state.reject_after_refresh.load(Ordering::SeqCst) {
        *state.accepted.lock().unwrap() = state.refreshed_token.clone();
    }
    ok(json!({ "token": state.refreshed_token, "refreshToken": "refresh-2" }))
}

async fn logout(State(state): State<Arc<MockState>>) -> Response {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "success": true, "message": "Logged out" })).into_response()
}

async fn stats(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    ok(json!({
        "totalUsers": 120,
        "activeUsers": 90,
        "newUsersThisMonth": 12,
        "adminCount": 2,
        "moderatorCount": 5,
    }))
}

async fn growth(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    let days: usize = query.get("days").and_then(|d| d.parse().ok()).unwrap_or(30);
    let points: Vec<Value> = (0..days.min(3))
        .map(|i| json!({ "date": format!("2026-03-0{}", i + 1), "count": i + 1 }))
        .collect();
    ok(json!(points))
}

async fn activity(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    let limit: usize = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(10);
    let entries: Vec<Value> = (0..limit.min(2))
        .map(|i| {
            json!({
                "id": format!("a{}", i),
                "userEmail": "admin@example.com",
                "action": "user.update",
                "timestamp": "2026-03-01T12:00:00Z",
            })
        })
        .collect();
    ok(json!(entries))
}

async fn list_users(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    let page: u32 = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let limit: u32 = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(10);
    let mut items = vec![user_json("1"), user_json("2")];
    if let Some(search) = query.get("search") {
        items[0]["email"] = json!(format!("{}@example.com", search));
        items.truncate(1);
    }
    ok(json!({
        "items": items,
        "total": 25,
        "page": page,
        "limit": limit,
        "totalPages": 25u32.div_ceil(limit.max(1)),
    }))
}

async fn get_user(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    if id == "missing" {
        return fail(StatusCode::NOT_FOUND, "User not found");
    }
    ok(user_json(&id))
}

async fn delete_user(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    if id == "missing" {
        return fail(StatusCode::NOT_FOUND, "User not found");
    }
    Json(json!({ "success": true, "message": "User deleted" })).into_response()
}

async fn set_status(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    let mut user = user_json(&id);
    user["isActive"] = body["isActive"].clone();
    ok(user)
}

async fn slow() -> Response {
    tokio::time::sleep(Duration::from_secs(5)).await;
    ok(json!(null))
}
