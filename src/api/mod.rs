//! HTTP client adapter for the Pilotage Micro backend.
//!
//! All requests are JSON in/out (except the invoice PDF download), carry
//! `Authorization: Bearer <token>` when a token is supplied, and are
//! bounded by a fixed 10-second timeout. There is no retry policy: one
//! attempt per call, and any transport-level failure is reported as
//! [`ApiError::Offline`].

pub mod error;
pub mod types;

pub use error::ApiError;
pub use types::*;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Client-side timeout for a single request attempt.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Message substituted when a 2xx body cannot be decoded.
pub const INVALID_RESPONSE: &str = "Réponse serveur invalide";

/// HTTP client bound to one backend host. Cheap to clone (shares the
/// underlying connection pool).
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given backend host (e.g.
    /// `http://localhost:8001`). The `/api` prefix is added per request.
    pub fn new(base_url: &str) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| crate::Error::Other(format!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL for an API path (path starts with `/`).
    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Send a request and return the raw body bytes of a 2xx response.
    ///
    /// Non-2xx responses are classified via [`ApiError::from_status`],
    /// reading the backend's `{"detail": ...}` error body when it parses.
    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.url(path);
        debug!(%method, %url, "API call");

        let mut request = self
            .http
            .request(method, url.as_str())
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(%url, error = %e, "transport failure");
            ApiError::Offline
        })?;

        let status = response.status().as_u16();
        debug!(%url, status, "API response");

        let bytes = response.bytes().await.map_err(|e| {
            warn!(%url, error = %e, "failed reading response body");
            ApiError::Offline
        })?;

        if !(200..300).contains(&status) {
            let detail = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .map(|b| b.detail);
            return Err(ApiError::from_status(status, detail));
        }

        Ok(bytes.to_vec())
    }

    /// Send a request and decode the 2xx response body as JSON.
    async fn execute_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let bytes = self.execute(method, path, body, token).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(path, error = %e, "undecodable 2xx body");
            ApiError::Server {
                status: 200,
                message: INVALID_RESPONSE.to_string(),
            }
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, ApiError> {
        self.execute_json::<T, ()>(Method::GET, path, None, Some(token))
            .await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        self.execute_json(Method::POST, path, body, token).await
    }

    // ---- Authentication ----

    /// `POST /auth/login`
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        self.post("/auth/login", Some(&LoginRequest { email, password }), None)
            .await
    }

    /// `POST /auth/register`
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<AuthResponse, ApiError> {
        self.post(
            "/auth/register",
            Some(&RegisterRequest {
                email,
                password,
                first_name,
                last_name,
            }),
            None,
        )
        .await
    }

    /// `GET /auth/me` - validate a bearer token and fetch its identity.
    pub async fn me(&self, token: &str) -> Result<User, ApiError> {
        self.get("/auth/me", token).await
    }

    // ---- Profile ----

    /// `GET /profile`
    pub async fn get_profile(&self, token: &str) -> Result<UserProfile, ApiError> {
        self.get("/profile", token).await
    }

    /// `POST /profile` - completes onboarding server-side.
    pub async fn create_profile(
        &self,
        token: &str,
        profile: &ProfileRequest,
    ) -> Result<UserProfile, ApiError> {
        self.post("/profile", Some(profile), Some(token)).await
    }

    /// `PUT /profile`
    pub async fn update_profile(
        &self,
        token: &str,
        profile: &ProfileRequest,
    ) -> Result<UserProfile, ApiError> {
        self.execute_json(Method::PUT, "/profile", Some(profile), Some(token))
            .await
    }

    // ---- Invoices ----

    /// `GET /invoices`
    pub async fn list_invoices(&self, token: &str) -> Result<Vec<Invoice>, ApiError> {
        self.get("/invoices", token).await
    }

    /// `POST /invoices`
    pub async fn create_invoice(
        &self,
        token: &str,
        invoice: &InvoiceCreate,
    ) -> Result<Invoice, ApiError> {
        self.post("/invoices", Some(invoice), Some(token)).await
    }

    /// `PUT /invoices/{id}/status?status=...` - the backend takes the new
    /// status as a query parameter, not a body.
    pub async fn update_invoice_status(
        &self,
        token: &str,
        invoice_id: &str,
        status: &str,
    ) -> Result<MessageResponse, ApiError> {
        let path = format!("/invoices/{}/status?status={}", invoice_id, status);
        self.execute_json::<MessageResponse, ()>(Method::PUT, &path, None, Some(token))
            .await
    }

    /// `GET /invoices/{id}/pdf` - returns the raw PDF bytes.
    pub async fn invoice_pdf(&self, token: &str, invoice_id: &str) -> Result<Vec<u8>, ApiError> {
        let path = format!("/invoices/{}/pdf", invoice_id);
        self.execute::<()>(Method::GET, &path, None, Some(token))
            .await
    }

    // ---- Clients ----

    /// `GET /clients`
    pub async fn list_clients(&self, token: &str) -> Result<Vec<ClientRecord>, ApiError> {
        self.get("/clients", token).await
    }

    /// `POST /clients`
    pub async fn create_client(
        &self,
        token: &str,
        client: &ClientCreate,
    ) -> Result<ClientRecord, ApiError> {
        self.post("/clients", Some(client), Some(token)).await
    }

    // ---- Dashboard ----

    /// `GET /dashboard`
    pub async fn dashboard(&self, token: &str) -> Result<DashboardSummary, ApiError> {
        self.get("/dashboard", token).await
    }

    // ---- Notifications ----

    /// `GET /notifications`
    pub async fn list_notifications(&self, token: &str) -> Result<Vec<Notification>, ApiError> {
        self.get("/notifications", token).await
    }

    /// `POST /notifications/{id}/read`
    pub async fn mark_notification_read(
        &self,
        token: &str,
        notification_id: &str,
    ) -> Result<MessageResponse, ApiError> {
        let path = format!("/notifications/{}/read", notification_id);
        self.post::<MessageResponse, ()>(&path, None, Some(token))
            .await
    }

    // ---- Demo data helpers ----

    /// `POST /mock/init-obligations`
    pub async fn init_obligations(&self, token: &str) -> Result<MessageResponse, ApiError> {
        self.post::<MessageResponse, ()>("/mock/init-obligations", None, Some(token))
            .await
    }

    /// `POST /mock/schedule-notifications`
    pub async fn schedule_notifications(&self, token: &str) -> Result<MessageResponse, ApiError> {
        self.post::<MessageResponse, ()>("/mock/schedule-notifications", None, Some(token))
            .await
    }
}
