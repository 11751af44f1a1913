//! Common test utilities: an isolated environment for the `pm` binary
//! and an in-process mock of the Pilotage Micro backend.
//!
//! The mock speaks just enough of the real API (see the backend's
//! FastAPI routes) for the session and CLI flows under test: bearer-token
//! auth with `{"detail": ...}` error bodies, invoices, profile, dashboard
//! and notifications.

#![allow(dead_code)]

use assert_cmd::Command;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
pub use tempfile::TempDir;

/// A test environment with an isolated data directory.
///
/// `PM_DATA_DIR` is set per-invocation, so tests are parallel-safe and
/// never touch the user's `~/.local/share/pilotage/`.
pub struct TestEnv {
    pub data_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the pm binary with the isolated data directory
    /// and the given backend URL.
    pub fn pm(&self, api_url: &str) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_pm"));
        cmd.env("PM_DATA_DIR", self.data_dir.path());
        cmd.env("PM_API_URL", api_url);
        cmd
    }
}

#[derive(Clone)]
struct MockUser {
    id: String,
    email: String,
    password: String,
    first_name: String,
    last_name: String,
    is_onboarded: bool,
}

impl MockUser {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "email": self.email,
            "first_name": self.first_name,
            "last_name": self.last_name,
            "is_onboarded": self.is_onboarded,
        })
    }
}

#[derive(Default)]
struct BackendState {
    requests: AtomicUsize,
    next_id: AtomicUsize,
    users: Mutex<HashMap<String, MockUser>>,
    /// token -> user email
    tokens: Mutex<HashMap<String, String>>,
    invoices: Mutex<Vec<Value>>,
    notifications: Mutex<Vec<Value>>,
    profiles: Mutex<HashMap<String, Value>>,
    /// Artificial latency for GET /auth/me, for race tests.
    me_delay_ms: AtomicU64,
}

/// In-process mock backend bound to an ephemeral port.
pub struct MockBackend {
    pub base_url: String,
    state: Arc<BackendState>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());

        let app = Router::new()
            .route("/api/auth/register", post(auth_register))
            .route("/api/auth/login", post(auth_login))
            .route("/api/auth/me", get(auth_me))
            .route("/api/profile", get(profile_get).post(profile_create))
            .route("/api/invoices", get(invoices_list).post(invoices_create))
            .route("/api/invoices/:id/status", put(invoice_status))
            .route("/api/invoices/:id/pdf", get(invoice_pdf))
            .route("/api/dashboard", get(dashboard))
            .route("/api/notifications", get(notifications_list))
            .route("/api/notifications/:id/read", post(notification_read))
            .route("/api/mock/init-obligations", post(mock_ack))
            .route("/api/mock/schedule-notifications", post(mock_ack))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Number of requests the backend has served.
    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Register a user directly in the backend state.
    pub fn seed_user(&self, id: &str, email: &str, password: &str, is_onboarded: bool) {
        self.state.users.lock().unwrap().insert(
            email.to_string(),
            MockUser {
                id: id.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                first_name: "Jean".to_string(),
                last_name: "Dupont".to_string(),
                is_onboarded,
            },
        );
    }

    /// Issue a valid bearer token for a seeded user.
    pub fn issue_token(&self, email: &str) -> String {
        let n = self.state.next_id.fetch_add(1, Ordering::SeqCst);
        let token = format!("tok-{}", n);
        self.state
            .tokens
            .lock()
            .unwrap()
            .insert(token.clone(), email.to_string());
        token
    }

    /// Invalidate every outstanding token: all authenticated calls start
    /// answering 401.
    pub fn revoke_all_tokens(&self) {
        self.state.tokens.lock().unwrap().clear();
    }

    /// Delay responses of `GET /auth/me` (race tests).
    pub fn set_me_delay(&self, delay: Duration) {
        self.state
            .me_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

fn error_body(status: StatusCode, detail: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({"detail": detail})))
}

/// Resolve the bearer token from the request, or answer 401.
fn authenticate(
    state: &BackendState,
    headers: &HeaderMap,
) -> Result<MockUser, (StatusCode, Json<Value>)> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| error_body(StatusCode::UNAUTHORIZED, "Token invalide"))?;

    let email = state
        .tokens
        .lock()
        .unwrap()
        .get(token)
        .cloned()
        .ok_or_else(|| error_body(StatusCode::UNAUTHORIZED, "Token invalide"))?;

    state
        .users
        .lock()
        .unwrap()
        .get(&email)
        .cloned()
        .ok_or_else(|| error_body(StatusCode::UNAUTHORIZED, "Token invalide"))
}

fn issue_token_for(state: &BackendState, email: &str) -> String {
    let n = state.next_id.fetch_add(1, Ordering::SeqCst);
    let token = format!("tok-{}", n);
    state
        .tokens
        .lock()
        .unwrap()
        .insert(token.clone(), email.to_string());
    token
}

async fn auth_register(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.requests.fetch_add(1, Ordering::SeqCst);

    let email = body["email"].as_str().unwrap_or_default().to_string();
    if state.users.lock().unwrap().contains_key(&email) {
        return error_body(StatusCode::BAD_REQUEST, "Email déjà utilisé");
    }

    let n = state.next_id.fetch_add(1, Ordering::SeqCst);
    let user = MockUser {
        id: format!("u-{}", n),
        email: email.clone(),
        password: body["password"].as_str().unwrap_or_default().to_string(),
        first_name: body["first_name"].as_str().unwrap_or_default().to_string(),
        last_name: body["last_name"].as_str().unwrap_or_default().to_string(),
        is_onboarded: false,
    };
    let user_json = user.to_json();
    state.users.lock().unwrap().insert(email.clone(), user);

    let token = issue_token_for(&state, &email);
    (
        StatusCode::OK,
        Json(json!({"access_token": token, "token_type": "bearer", "user": user_json})),
    )
}

async fn auth_login(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.requests.fetch_add(1, Ordering::SeqCst);

    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let user = match state.users.lock().unwrap().get(email) {
        Some(user) if user.password == password => user.clone(),
        _ => return error_body(StatusCode::BAD_REQUEST, "Identifiants invalides"),
    };

    let token = issue_token_for(&state, email);
    (
        StatusCode::OK,
        Json(json!({"access_token": token, "token_type": "bearer", "user": user.to_json()})),
    )
}

async fn auth_me(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> impl IntoResponse {
    state.requests.fetch_add(1, Ordering::SeqCst);

    let delay = state.me_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    match authenticate(&state, &headers) {
        Ok(user) => (StatusCode::OK, Json(user.to_json())),
        Err(err) => err,
    }
}

async fn profile_get(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(err) => return err,
    };

    match state.profiles.lock().unwrap().get(&user.id) {
        Some(profile) => (StatusCode::OK, Json(profile.clone())),
        None => error_body(StatusCode::NOT_FOUND, "Profil non trouvé"),
    }
}

async fn profile_create(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(err) => return err,
    };

    if state.profiles.lock().unwrap().contains_key(&user.id) {
        return error_body(StatusCode::BAD_REQUEST, "Profil déjà créé");
    }

    let n = state.next_id.fetch_add(1, Ordering::SeqCst);
    let mut profile = body;
    profile["id"] = json!(format!("p-{}", n));
    profile["user_id"] = json!(user.id);
    state
        .profiles
        .lock()
        .unwrap()
        .insert(user.id.clone(), profile.clone());

    // Mirrors the real backend: creating the profile completes onboarding.
    if let Some(stored) = state.users.lock().unwrap().get_mut(&user.email) {
        stored.is_onboarded = true;
    }

    (StatusCode::OK, Json(profile))
}

async fn invoices_list(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if let Err(err) = authenticate(&state, &headers) {
        return err;
    }
    let invoices = state.invoices.lock().unwrap().clone();
    (StatusCode::OK, Json(Value::Array(invoices)))
}

async fn invoices_create(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(err) => return err,
    };

    let n = state.next_id.fetch_add(1, Ordering::SeqCst);
    let amount_ht = body["amount_ht"].as_f64().unwrap_or_default();
    let mut invoice = body;
    invoice["id"] = json!(format!("inv-{}", n));
    invoice["user_id"] = json!(user.id);
    invoice["invoice_number"] = json!(format!("FAC-2025-{:04}", n));
    invoice["vat_amount"] = json!(0.0);
    invoice["amount_ttc"] = json!(amount_ht);
    invoice["status"] = json!("draft");

    state.invoices.lock().unwrap().push(invoice.clone());
    (StatusCode::OK, Json(invoice))
}

async fn invoice_status(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if let Err(err) = authenticate(&state, &headers) {
        return err;
    }

    let status = params.get("status").cloned().unwrap_or_default();
    let mut invoices = state.invoices.lock().unwrap();
    match invoices.iter_mut().find(|inv| inv["id"] == json!(id)) {
        Some(invoice) => {
            invoice["status"] = json!(status);
            (StatusCode::OK, Json(json!({"message": "Statut mis à jour"})))
        }
        None => error_body(StatusCode::NOT_FOUND, "Facture non trouvée"),
    }
}

async fn invoice_pdf(
    State(state): State<Arc<BackendState>>,
    Path(_id): Path<String>,
    headers: HeaderMap,
) -> axum::response::Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if let Err(err) = authenticate(&state, &headers) {
        return err.into_response();
    }

    (
        [(header::CONTENT_TYPE, "application/pdf")],
        b"%PDF-1.4 mock invoice".to_vec(),
    )
        .into_response()
}

async fn dashboard(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if let Err(err) = authenticate(&state, &headers) {
        return err;
    }

    let revenue: f64 = state
        .invoices
        .lock()
        .unwrap()
        .iter()
        .filter(|inv| inv["status"] == json!("paid"))
        .filter_map(|inv| inv["amount_ttc"].as_f64())
        .sum();

    (
        StatusCode::OK,
        Json(json!({
            "current_revenue": revenue,
            "micro_threshold": 77700.0,
            "vat_threshold": 36800.0,
            "micro_threshold_percent": revenue / 777.0,
            "vat_threshold_percent": revenue / 368.0,
            "next_obligations": [],
            "recent_transactions": [],
            "activity_type": "BNC",
            "vat_regime": "franchise",
            "urssaf_periodicity": "monthly",
        })),
    )
}

async fn notifications_list(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if let Err(err) = authenticate(&state, &headers) {
        return err;
    }
    let notifications = state.notifications.lock().unwrap().clone();
    (StatusCode::OK, Json(Value::Array(notifications)))
}

async fn notification_read(
    State(state): State<Arc<BackendState>>,
    Path(_id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if let Err(err) = authenticate(&state, &headers) {
        return err;
    }
    (StatusCode::OK, Json(json!({"message": "Notification lue"})))
}

async fn mock_ack(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> impl IntoResponse {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if let Err(err) = authenticate(&state, &headers) {
        return err;
    }
    (StatusCode::OK, Json(json!({"message": "3 obligations créées"})))
}
