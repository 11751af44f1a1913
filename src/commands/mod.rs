//! Command implementations for the `pm` CLI.
//!
//! Each function maps one CLI command onto the session manager, and
//! returns a [`CommandOutput`] that main prints as JSON or, under
//! `-H/--human`, as prose.

use crate::api::{ClientCreate, InvoiceCreate, ProfileRequest};
use crate::config::PilotageConfig;
use crate::session::SessionManager;
use crate::{ApiError, Error, Result};
use chrono::NaiveDate;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Result of a command, in both output formats.
#[derive(Debug)]
pub struct CommandOutput {
    pub json: serde_json::Value,
    pub human: String,
}

impl CommandOutput {
    fn new(json: serde_json::Value, human: impl Into<String>) -> Self {
        Self {
            json,
            human: human.into(),
        }
    }
}

/// Print a command result in the requested format.
pub fn print(output: &CommandOutput, human: bool) {
    if human {
        println!("{}", output.human);
    } else {
        println!("{}", output.json);
    }
}

/// Resume the saved session and fail with a login hint if none exists.
async fn require_session(session: &SessionManager) -> Result<()> {
    let snapshot = session.restore().await;
    if snapshot.is_authenticated() {
        Ok(())
    } else if !snapshot.is_online() {
        Err(ApiError::Offline.into())
    } else {
        Err(ApiError::Validation("Non connecté, utilisez `pm login`".to_string()).into())
    }
}

// ---- Authentication ----

pub async fn register(
    session: &SessionManager,
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
) -> Result<CommandOutput> {
    let user = session.register(email, password, first_name, last_name).await?;
    Ok(CommandOutput::new(
        json!({"registered": true, "user": &user}),
        format!("Compte créé. Bienvenue, {} {} !", user.first_name, user.last_name),
    ))
}

pub async fn login(
    session: &SessionManager,
    email: &str,
    password: &str,
) -> Result<CommandOutput> {
    let user = session.login(email, password).await?;
    Ok(CommandOutput::new(
        json!({"authenticated": true, "user": &user}),
        format!("Connecté en tant que {}", user.email),
    ))
}

pub fn logout(session: &SessionManager) -> Result<CommandOutput> {
    session.logout();
    Ok(CommandOutput::new(
        json!({"authenticated": false}),
        "Déconnecté.",
    ))
}

pub async fn whoami(session: &SessionManager) -> Result<CommandOutput> {
    let snapshot = session.restore().await;
    match snapshot.user {
        Some(user) => Ok(CommandOutput::new(
            json!({"authenticated": true, "user": &user}),
            format!(
                "{} {} <{}>{}",
                user.first_name,
                user.last_name,
                user.email,
                if user.is_onboarded {
                    ""
                } else {
                    " (profil fiscal à compléter)"
                }
            ),
        )),
        None => {
            let note = if snapshot.is_online() {
                "Non connecté."
            } else {
                "Non connecté (serveur injoignable)."
            };
            Ok(CommandOutput::new(
                json!({"authenticated": false, "online": snapshot.is_online()}),
                note,
            ))
        }
    }
}

// ---- Profile ----

pub async fn profile_show(session: &SessionManager) -> Result<CommandOutput> {
    require_session(session).await?;
    let profile = session.get_profile().await?;
    let human = format!(
        "Activité {} / URSSAF {} / TVA {}\nSeuil micro: {:.0} € - Seuil TVA: {:.0} €",
        profile.activity_type,
        profile.urssaf_periodicity,
        profile.vat_regime,
        profile.micro_threshold,
        profile.vat_threshold,
    );
    Ok(CommandOutput::new(serde_json::to_value(&profile)?, human))
}

fn validate_profile(request: &ProfileRequest) -> Result<()> {
    if !matches!(request.activity_type.as_str(), "BIC" | "BNC") {
        return Err(ApiError::Validation("Type d'activité invalide (BIC ou BNC)".to_string()).into());
    }
    if !matches!(request.urssaf_periodicity.as_str(), "monthly" | "quarterly") {
        return Err(ApiError::Validation(
            "Périodicité URSSAF invalide (monthly ou quarterly)".to_string(),
        )
        .into());
    }
    if !matches!(request.vat_regime.as_str(), "franchise" | "simplified" | "real") {
        return Err(ApiError::Validation(
            "Régime TVA invalide (franchise, simplified ou real)".to_string(),
        )
        .into());
    }
    Ok(())
}

pub async fn profile_create(
    session: &SessionManager,
    request: ProfileRequest,
) -> Result<CommandOutput> {
    validate_profile(&request)?;
    require_session(session).await?;
    let profile = session.create_profile(&request).await?;

    // The backend flips is_onboarded as a side effect; pull the fresh
    // user record so the local session agrees.
    if let Err(e) = session.refresh().await {
        debug!(error = %e, "session refresh after profile creation failed");
    }

    Ok(CommandOutput::new(
        serde_json::to_value(&profile)?,
        "Profil fiscal créé, onboarding terminé.",
    ))
}

pub async fn profile_update(
    session: &SessionManager,
    request: ProfileRequest,
) -> Result<CommandOutput> {
    validate_profile(&request)?;
    require_session(session).await?;
    let profile = session.update_profile(&request).await?;
    Ok(CommandOutput::new(
        serde_json::to_value(&profile)?,
        "Profil fiscal mis à jour.",
    ))
}

// ---- Invoices ----

pub async fn invoice_list(session: &SessionManager) -> Result<CommandOutput> {
    require_session(session).await?;
    let invoices = session.list_invoices().await?;

    let mut lines = Vec::with_capacity(invoices.len());
    for invoice in &invoices {
        lines.push(format!(
            "{}  {:10}  {:>10.2} € TTC  [{}]",
            invoice.invoice_number, invoice.client_name, invoice.amount_ttc, invoice.status
        ));
    }
    let human = if lines.is_empty() {
        "Aucune facture.".to_string()
    } else {
        lines.join("\n")
    };

    Ok(CommandOutput::new(serde_json::to_value(&invoices)?, human))
}

#[allow(clippy::too_many_arguments)]
pub async fn invoice_create(
    session: &SessionManager,
    client_name: String,
    client_email: String,
    client_address: String,
    amount_ht: f64,
    description: String,
    due_date: Option<String>,
) -> Result<CommandOutput> {
    if amount_ht <= 0.0 {
        return Err(ApiError::Validation("Le montant HT doit être positif".to_string()).into());
    }
    // Validate the date client-side; the backend expects ISO 8601.
    let due_date = match due_date {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                Error::from(ApiError::Validation(
                    "Date d'échéance invalide (format AAAA-MM-JJ)".to_string(),
                ))
            })?;
            Some(format!("{}T00:00:00", date))
        }
        None => None,
    };

    require_session(session).await?;
    let invoice = session
        .create_invoice(&InvoiceCreate {
            client_name,
            client_email,
            client_address,
            amount_ht,
            description,
            due_date,
        })
        .await?;

    Ok(CommandOutput::new(
        serde_json::to_value(&invoice)?,
        format!(
            "Facture {} créée: {:.2} € HT / {:.2} € TTC",
            invoice.invoice_number, invoice.amount_ht, invoice.amount_ttc
        ),
    ))
}

/// Statuses the backend accepts for an invoice.
pub const INVOICE_STATUSES: [&str; 4] = ["draft", "sent", "paid", "overdue"];

pub async fn invoice_status(
    session: &SessionManager,
    invoice_id: &str,
    status: &str,
) -> Result<CommandOutput> {
    if !INVOICE_STATUSES.contains(&status) {
        return Err(ApiError::Validation(format!(
            "Statut invalide: {} (attendu: {})",
            status,
            INVOICE_STATUSES.join(", ")
        ))
        .into());
    }

    require_session(session).await?;
    let response = session.update_invoice_status(invoice_id, status).await?;
    Ok(CommandOutput::new(
        json!({"message": &response.message}),
        response.message,
    ))
}

pub async fn invoice_pdf(
    session: &SessionManager,
    invoice_id: &str,
    output: Option<PathBuf>,
) -> Result<CommandOutput> {
    require_session(session).await?;
    let bytes = session.invoice_pdf(invoice_id).await?;

    let path = output.unwrap_or_else(|| PathBuf::from(format!("{}.pdf", invoice_id)));
    std::fs::write(&path, &bytes)?;

    Ok(CommandOutput::new(
        json!({"written": &path, "bytes": bytes.len()}),
        format!("PDF écrit dans {} ({} octets)", path.display(), bytes.len()),
    ))
}

// ---- Clients ----

pub async fn client_list(session: &SessionManager) -> Result<CommandOutput> {
    require_session(session).await?;
    let clients = session.list_clients().await?;

    let mut lines = Vec::with_capacity(clients.len());
    for client in &clients {
        lines.push(format!(
            "{}  <{}>  {} facture(s), {:.2} €",
            client.name, client.email, client.total_invoices, client.total_amount
        ));
    }
    let human = if lines.is_empty() {
        "Aucun client.".to_string()
    } else {
        lines.join("\n")
    };

    Ok(CommandOutput::new(serde_json::to_value(&clients)?, human))
}

pub async fn client_add(session: &SessionManager, client: ClientCreate) -> Result<CommandOutput> {
    if client.name.trim().is_empty() || client.email.trim().is_empty() {
        return Err(ApiError::Validation("Nom et email requis".to_string()).into());
    }

    require_session(session).await?;
    let created = session.create_client(&client).await?;
    Ok(CommandOutput::new(
        serde_json::to_value(&created)?,
        format!("Client {} ajouté.", created.name),
    ))
}

// ---- Dashboard ----

pub async fn dashboard(session: &SessionManager) -> Result<CommandOutput> {
    require_session(session).await?;
    let summary = session.dashboard().await?;

    let mut human = format!(
        "Chiffre d'affaires {}: {:.2} €\nSeuil micro: {:.1}% de {:.0} €\nSeuil TVA: {:.1}% de {:.0} €",
        summary.activity_type,
        summary.current_revenue,
        summary.micro_threshold_percent,
        summary.micro_threshold,
        summary.vat_threshold_percent,
        summary.vat_threshold,
    );
    if !summary.next_obligations.is_empty() {
        human.push_str("\nProchaines échéances:");
        for obligation in &summary.next_obligations {
            human.push_str(&format!("\n  - {} ({})", obligation.title, obligation.due_date));
        }
    }

    Ok(CommandOutput::new(serde_json::to_value(&summary)?, human))
}

// ---- Notifications ----

pub async fn notifications_list(session: &SessionManager) -> Result<CommandOutput> {
    require_session(session).await?;
    let notifications = session.list_notifications().await?;

    let mut lines = Vec::with_capacity(notifications.len());
    for notification in &notifications {
        let marker = if notification.read_date.is_some() {
            " "
        } else {
            "*"
        };
        lines.push(format!("{} {}  {}", marker, notification.title, notification.message));
    }
    let human = if lines.is_empty() {
        "Aucune notification.".to_string()
    } else {
        lines.join("\n")
    };

    Ok(CommandOutput::new(serde_json::to_value(&notifications)?, human))
}

pub async fn notification_read(
    session: &SessionManager,
    notification_id: &str,
) -> Result<CommandOutput> {
    require_session(session).await?;
    let response = session.mark_notification_read(notification_id).await?;
    Ok(CommandOutput::new(
        json!({"message": &response.message}),
        response.message,
    ))
}

// ---- Demo data ----

pub async fn mock_init_obligations(session: &SessionManager) -> Result<CommandOutput> {
    require_session(session).await?;
    let response = session.init_obligations().await?;
    Ok(CommandOutput::new(
        json!({"message": &response.message}),
        response.message,
    ))
}

pub async fn mock_schedule_notifications(session: &SessionManager) -> Result<CommandOutput> {
    require_session(session).await?;
    let response = session.schedule_notifications().await?;
    Ok(CommandOutput::new(
        json!({"message": &response.message}),
        response.message,
    ))
}

// ---- Configuration ----

pub fn config_show(
    data_dir: &Path,
    config: &PilotageConfig,
    cli_api_url: Option<&str>,
) -> Result<CommandOutput> {
    let effective_url = config.resolve_api_url(cli_api_url);
    let format = config.output_format.unwrap_or_default();
    Ok(CommandOutput::new(
        json!({
            "api_url": effective_url,
            "output_format": format.as_str(),
            "data_dir": data_dir,
        }),
        format!(
            "API: {}\nFormat: {}\nDonnées: {}",
            effective_url,
            format,
            data_dir.display()
        ),
    ))
}

pub fn config_set_url(data_dir: &Path, url: &str) -> Result<CommandOutput> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(Error::Config(format!("URL invalide: {}", url)));
    }

    let mut config = PilotageConfig::load(data_dir);
    config.api_url = Some(url.trim_end_matches('/').to_string());
    config
        .save(data_dir)
        .map_err(|e| Error::Config(format!("écriture de config.kdl impossible: {}", e)))?;

    Ok(CommandOutput::new(
        json!({"api_url": config.api_url}),
        format!("URL du backend enregistrée: {}", url.trim_end_matches('/')),
    ))
}
