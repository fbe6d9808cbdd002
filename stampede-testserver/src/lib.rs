use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep};

pub const PATH_HEALTH: &str = "/api/health";
pub const PATH_LOGIN: &str = "/api/auth/login";
pub const PATH_PROFILE: &str = "/api/users/profile";
pub const PATH_OK: &str = "/ok";
pub const PATH_FAIL: &str = "/fail";
pub const PATH_SLOW: &str = "/slow";
pub const PATH_ECHO: &str = "/echo";

pub const TOKEN_USER: &str = "tok-user";
pub const TOKEN_ADMIN: &str = "tok-admin";
pub const TOKEN_PARTNER: &str = "tok-partner";

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    authorized_requests: Arc<AtomicU64>,
    unauthorized_requests: Arc<AtomicU64>,
}

impl TestServerStats {
    fn inc_requests_total(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_authorized(&self) {
        self.authorized_requests.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_unauthorized(&self) {
        self.unauthorized_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn authorized_requests(&self) -> u64 {
        self.authorized_requests.load(Ordering::Relaxed)
    }

    pub fn unauthorized_requests(&self) -> u64 {
        self.unauthorized_requests.load(Ordering::Relaxed)
    }
}

async fn handle_health(State(stats): State<TestServerStats>) -> Json<serde_json::Value> {
    stats.inc_requests_total();
    Json(serde_json::json!({"status": "ok"}))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    #[allow(dead_code)]
    password: String,
}

/// Hands out a role-specific bearer token based on the email prefix, the way
/// the harness expects a login endpoint to behave.
async fn handle_login(
    State(stats): State<TestServerStats>,
    body: Bytes,
) -> (StatusCode, Json<serde_json::Value>) {
    stats.inc_requests_total();

    let req: LoginRequest = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "bad json"})),
            );
        }
    };

    let token = if req.email.starts_with("admin") {
        TOKEN_ADMIN
    } else if req.email.starts_with("partner") {
        TOKEN_PARTNER
    } else {
        TOKEN_USER
    };

    (StatusCode::OK, Json(serde_json::json!({"token": token})))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn handle_profile(
    State(stats): State<TestServerStats>,
    headers: HeaderMap,
) -> (StatusCode, Json<serde_json::Value>) {
    stats.inc_requests_total();

    match bearer_token(&headers) {
        Some(TOKEN_USER | TOKEN_ADMIN | TOKEN_PARTNER) => {
            stats.inc_authorized();
            (
                StatusCode::OK,
                Json(serde_json::json!({"email": "user@example.com"})),
            )
        }
        _ => {
            stats.inc_unauthorized();
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"error": "unauthorized"})),
            )
        }
    }
}

async fn handle_ok(State(stats): State<TestServerStats>) -> &'static str {
    stats.inc_requests_total();
    "ok"
}

async fn handle_fail(State(stats): State<TestServerStats>) -> (StatusCode, &'static str) {
    stats.inc_requests_total();
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn handle_slow(
    State(stats): State<TestServerStats>,
    Query(query): Query<HashMap<String, String>>,
) -> &'static str {
    stats.inc_requests_total();

    let ms = query
        .get("ms")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(50);
    sleep(Duration::from_millis(ms)).await;
    "slow"
}

async fn handle_echo(State(stats): State<TestServerStats>, body: Bytes) -> (StatusCode, Bytes) {
    stats.inc_requests_total();
    (StatusCode::OK, body)
}

pub fn router(stats: TestServerStats) -> Router {
    Router::new()
        .route(PATH_HEALTH, get(handle_health))
        .route(PATH_LOGIN, post(handle_login))
        .route(PATH_PROFILE, get(handle_profile))
        .route(PATH_OK, get(handle_ok))
        .route(PATH_FAIL, get(handle_fail))
        .route(PATH_SLOW, get(handle_slow))
        .route(PATH_ECHO, post(handle_echo))
        .with_state(stats)
}

pub struct TestServer {
    addr: SocketAddr,
    base_url: String,
    stats: TestServerStats,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let stats = TestServerStats::default();
        let app = router(stats.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        let base_url = format!("http://{addr}");

        Ok(Self {
            addr,
            base_url,
            stats,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some()
            && let Some(task) = self.task.take()
        {
            task.abort();
        }
    }
}
