//! In-process fake backend and toast recorder shared by the client
//! integration tests.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use glowdesk_client::config::ClientConfig;
use glowdesk_client::http::ApiClient;
use glowdesk_client::session::SessionManager;
use glowdesk_core::session::MemoryTokenStore;
use glowdesk_core::toast::{ToastReporter, ToastSeverity};

/// How the fake `/auth/refresh` endpoint behaves.
pub enum RefreshMode {
    /// Issue this pair and start accepting its access token.
    Issue { access: String, refresh: String },
    /// Reject the refresh with a 401.
    Reject,
}

/// Mutable state behind the fake backend.
pub struct BackendState {
    /// The access token `/protected` currently accepts.
    pub valid_token: Mutex<String>,
    pub refresh_calls: AtomicUsize,
    pub refresh_delay_ms: AtomicU64,
    pub refresh_mode: Mutex<RefreshMode>,
    /// Hits on the non-auth resource routes, for no-retry assertions.
    pub resource_hits: AtomicUsize,
}

impl BackendState {
    fn new() -> Self {
        Self {
            valid_token: Mutex::new("a1".to_string()),
            refresh_calls: AtomicUsize::new(0),
            refresh_delay_ms: AtomicU64::new(0),
            refresh_mode: Mutex::new(RefreshMode::Issue {
                access: "a2".to_string(),
                refresh: "r2".to_string(),
            }),
            resource_hits: AtomicUsize::new(0),
        }
    }

    pub fn set_valid_token(&self, token: &str) {
        *self.valid_token.lock().unwrap() = token.to_string();
    }

    pub fn set_refresh_mode(&self, mode: RefreshMode) {
        *self.refresh_mode.lock().unwrap() = mode;
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

/// A running fake backend.
pub struct TestBackend {
    pub state: Arc<BackendState>,
    pub base_url: String,
}

/// Bind the fake backend on an ephemeral port and serve it in the
/// background for the rest of the test.
pub async fn spawn_backend() -> TestBackend {
    let state = Arc::new(BackendState::new());

    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/protected", get(protected))
        .route("/whoami", get(whoami))
        .route("/missing", get(missing))
        .route("/boom", get(boom))
        .route("/validate", post(validate))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test backend");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test backend");
    });

    TestBackend {
        state,
        base_url: format!("http://{addr}"),
    }
}

/// Build an [`ApiClient`] (in-memory token store) against the backend,
/// returning the toast recorder alongside it.
pub fn build_client(base_url: &str) -> (Arc<ApiClient>, Arc<RecordingToast>) {
    let config = ClientConfig {
        api_url: base_url.to_string(),
        ws_url: "ws://unused".to_string(),
        token_file: None,
    };
    let toast = RecordingToast::new();
    let transport = Arc::new(glowdesk_client::auth::HttpRefresher::new(base_url));
    let session = Arc::new(SessionManager::new(
        Arc::new(MemoryTokenStore::new()),
        transport,
    ));
    let client = Arc::new(ApiClient::new(&config, session, toast.clone()));
    (client, toast)
}

/// Toast reporter that records every message for assertions.
pub struct RecordingToast {
    messages: Mutex<Vec<(String, ToastSeverity)>>,
}

impl RecordingToast {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(Vec::new()),
        })
    }

    pub fn messages(&self) -> Vec<(String, ToastSeverity)> {
        self.messages.lock().unwrap().clone()
    }
}

impl ToastReporter for RecordingToast {
    fn show(&self, message: &str, severity: ToastSeverity) {
        self.messages
            .lock()
            .unwrap()
            .push((message.to_string(), severity));
    }
}

// ---- handlers ----

async fn login(
    State(_state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if body["password"] == "correct" {
        (
            StatusCode::OK,
            Json(json!({"access_token": "a1", "refresh_token": "r1"})),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid email or password", "code": "UNAUTHORIZED"})),
        )
    }
}

async fn refresh(
    State(state): State<Arc<BackendState>>,
    Json(_body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
    }

    // Whether the issued access token is one `/protected` accepts is up
    // to the test (it controls `valid_token` separately).
    let mode = state.refresh_mode.lock().unwrap();
    match &*mode {
        RefreshMode::Issue { access, refresh } => (
            StatusCode::OK,
            Json(json!({"access_token": access, "refresh_token": refresh})),
        ),
        RefreshMode::Reject => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Refresh token expired", "code": "UNAUTHORIZED"})),
        ),
    }
}

async fn protected(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.resource_hits.fetch_add(1, Ordering::SeqCst);

    let expected = format!("Bearer {}", state.valid_token.lock().unwrap());
    let presented = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if presented == expected {
        (StatusCode::OK, Json(json!({"ok": true})))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Access token expired", "code": "UNAUTHORIZED"})),
        )
    }
}

async fn whoami(headers: HeaderMap) -> Json<Value> {
    let presented = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(json!({ "authorization": presented }))
}

async fn missing(State(state): State<Arc<BackendState>>) -> (StatusCode, Json<Value>) {
    state.resource_hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "Branch not found", "code": "NOT_FOUND"})),
    )
}

async fn boom(State(state): State<Arc<BackendState>>) -> (StatusCode, Json<Value>) {
    state.resource_hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "unexpected database failure", "code": "INTERNAL_ERROR"})),
    )
}

async fn validate(State(state): State<Arc<BackendState>>) -> (StatusCode, Json<Value>) {
    state.resource_hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "Validation failed",
            "code": "VALIDATION_ERROR",
            "errors": {
                "name": ["Name is required"],
                "price": ["Price must be positive"]
            }
        })),
    )
}
