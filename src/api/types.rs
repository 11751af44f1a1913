//! Wire types for the Pilotage Micro REST API.
//!
//! Field names match the backend's JSON exactly (snake_case, French
//! domain vocabulary: `amount_ht` = pre-tax, `amount_ttc` = tax
//! included). Timestamps are kept as ISO 8601 strings because the
//! backend emits naive datetimes without a timezone marker.

use serde::{Deserialize, Serialize};

/// Authenticated user identity, as returned by `/auth/me` and inside
/// login/register responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub is_onboarded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Response body of `POST /auth/login` and `POST /auth/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: User,
}

/// Request body of `POST /auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Request body of `POST /auth/register`.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

/// Fiscal profile created during onboarding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub user_id: String,
    /// "BIC" or "BNC"
    pub activity_type: String,
    /// "monthly" or "quarterly"
    pub urssaf_periodicity: String,
    /// "franchise", "simplified" or "real"
    pub vat_regime: String,
    pub micro_threshold: f64,
    pub vat_threshold: f64,
    #[serde(default)]
    pub previous_year_turnover: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Request body of `POST /profile` and `PUT /profile`.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileRequest {
    pub activity_type: String,
    pub urssaf_periodicity: String,
    pub vat_regime: String,
    pub micro_threshold: f64,
    pub vat_threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_year_turnover: Option<f64>,
}

/// An invoice as stored server-side. Numbering, VAT and totals are
/// computed by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub user_id: String,
    pub invoice_number: String,
    pub client_name: String,
    pub client_email: String,
    pub client_address: String,
    pub amount_ht: f64,
    pub vat_amount: f64,
    pub amount_ttc: f64,
    pub description: String,
    /// "draft", "sent", "paid" or "overdue"
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub paid_at: Option<String>,
}

/// Request body of `POST /invoices`.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceCreate {
    pub client_name: String,
    pub client_email: String,
    pub client_address: String,
    pub amount_ht: f64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

/// A client (customer) record with invoicing aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub address: String,
    #[serde(default)]
    pub siret: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub total_invoices: u32,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Request body of `POST /clients`.
#[derive(Debug, Clone, Serialize)]
pub struct ClientCreate {
    pub name: String,
    pub email: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub siret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A pending fiscal obligation (URSSAF declaration, VAT return, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obligation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub due_date: String,
    pub status: String,
    #[serde(default)]
    pub estimated_amount: Option<f64>,
    #[serde(default)]
    pub checklist_items: Vec<String>,
}

/// A simulated bank transaction shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankTransaction {
    pub id: String,
    pub amount: f64,
    pub description: String,
    pub date: String,
    pub counterparty: String,
}

/// Response body of `GET /dashboard`: revenue against the fiscal
/// thresholds, plus upcoming obligations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub current_revenue: f64,
    pub micro_threshold: f64,
    pub vat_threshold: f64,
    pub micro_threshold_percent: f64,
    pub vat_threshold_percent: f64,
    #[serde(default)]
    pub next_obligations: Vec<Obligation>,
    #[serde(default)]
    pub recent_transactions: Vec<BankTransaction>,
    pub activity_type: String,
    pub vat_regime: String,
    pub urssaf_periodicity: String,
}

/// A scheduled notification (deadline reminders, overdue invoices).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub scheduled_date: Option<String>,
    #[serde(default)]
    pub sent_date: Option<String>,
    #[serde(default)]
    pub read_date: Option<String>,
    #[serde(default)]
    pub invoice_id: Option<String>,
}

/// Generic `{"message": ...}` acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error body shape used by the backend for all failures.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
