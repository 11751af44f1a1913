//! Pilotage CLI - command-line client for the Pilotage Micro API.

use clap::Parser;
use pilotage::api::{ApiClient, ClientCreate, ProfileRequest};
use pilotage::cli::{
    Cli, ClientCommands, Commands, ConfigCommands, InvoiceCommands, MockCommands,
    NotificationCommands, ProfileCommands,
};
use pilotage::commands::{self, CommandOutput};
use pilotage::config::{self, OutputFormat, PilotageConfig};
use pilotage::session::{SessionManager, TokenStore};
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Diagnostics go to stderr, controlled by PM_LOG (e.g. PM_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("PM_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let data_dir = match config::data_dir() {
        Ok(dir) => dir,
        Err(e) => {
            report_error(&format!("data directory unavailable: {}", e), cli.human_readable);
            process::exit(1);
        }
    };
    let file_config = PilotageConfig::load(&data_dir);

    // -H wins; otherwise the config file's output-format preference.
    let human = cli.human_readable
        || file_config.output_format == Some(OutputFormat::Human);

    match run_command(&cli, &data_dir, &file_config).await {
        Ok(output) => commands::print(&output, human),
        Err(e) => {
            report_error(&e.to_string(), human);
            process::exit(1);
        }
    }
}

fn report_error(message: &str, human: bool) {
    if human {
        eprintln!("Error: {}", message);
    } else {
        eprintln!("{}", serde_json::json!({"error": message}));
    }
}

/// Build the session manager for commands that talk to the backend.
fn build_session(cli: &Cli, file_config: &PilotageConfig) -> pilotage::Result<SessionManager> {
    let api_url = file_config.resolve_api_url(cli.api_url.as_deref());
    let api = ApiClient::new(&api_url)?;
    let store = TokenStore::new()?;
    Ok(SessionManager::new(api, store))
}

async fn run_command(
    cli: &Cli,
    data_dir: &std::path::Path,
    file_config: &PilotageConfig,
) -> pilotage::Result<CommandOutput> {
    // Config commands are local; everything else needs a session manager.
    if let Commands::Config { command } = &cli.command {
        return match command {
            ConfigCommands::Show => {
                commands::config_show(data_dir, file_config, cli.api_url.as_deref())
            }
            ConfigCommands::SetUrl { url } => commands::config_set_url(data_dir, url),
        };
    }

    let session = build_session(cli, file_config)?;

    match &cli.command {
        Commands::Register {
            email,
            password,
            first_name,
            last_name,
        } => commands::register(&session, email, password, first_name, last_name).await,

        Commands::Login { email, password } => commands::login(&session, email, password).await,

        Commands::Logout => commands::logout(&session),

        Commands::Whoami => commands::whoami(&session).await,

        Commands::Profile { command } => match command {
            ProfileCommands::Show => commands::profile_show(&session).await,
            ProfileCommands::Create {
                activity_type,
                urssaf_periodicity,
                vat_regime,
                micro_threshold,
                vat_threshold,
                previous_year_turnover,
            } => {
                commands::profile_create(
                    &session,
                    ProfileRequest {
                        activity_type: activity_type.clone(),
                        urssaf_periodicity: urssaf_periodicity.clone(),
                        vat_regime: vat_regime.clone(),
                        micro_threshold: *micro_threshold,
                        vat_threshold: *vat_threshold,
                        previous_year_turnover: *previous_year_turnover,
                    },
                )
                .await
            }
            ProfileCommands::Update {
                activity_type,
                urssaf_periodicity,
                vat_regime,
                micro_threshold,
                vat_threshold,
                previous_year_turnover,
            } => {
                commands::profile_update(
                    &session,
                    ProfileRequest {
                        activity_type: activity_type.clone(),
                        urssaf_periodicity: urssaf_periodicity.clone(),
                        vat_regime: vat_regime.clone(),
                        micro_threshold: *micro_threshold,
                        vat_threshold: *vat_threshold,
                        previous_year_turnover: *previous_year_turnover,
                    },
                )
                .await
            }
        },

        Commands::Invoice { command } => match command {
            InvoiceCommands::List => commands::invoice_list(&session).await,
            InvoiceCommands::Create {
                client_name,
                client_email,
                client_address,
                amount_ht,
                description,
                due_date,
            } => {
                commands::invoice_create(
                    &session,
                    client_name.clone(),
                    client_email.clone(),
                    client_address.clone(),
                    *amount_ht,
                    description.clone(),
                    due_date.clone(),
                )
                .await
            }
            InvoiceCommands::Status { id, status } => {
                commands::invoice_status(&session, id, status).await
            }
            InvoiceCommands::Pdf { id, output } => {
                commands::invoice_pdf(&session, id, output.clone()).await
            }
        },

        Commands::Client { command } => match command {
            ClientCommands::List => commands::client_list(&session).await,
            ClientCommands::Add {
                name,
                email,
                address,
                siret,
                phone,
                notes,
            } => {
                commands::client_add(
                    &session,
                    ClientCreate {
                        name: name.clone(),
                        email: email.clone(),
                        address: address.clone(),
                        siret: siret.clone(),
                        phone: phone.clone(),
                        notes: notes.clone(),
                    },
                )
                .await
            }
        },

        Commands::Dashboard => commands::dashboard(&session).await,

        Commands::Notifications { command } => match command {
            NotificationCommands::List => commands::notifications_list(&session).await,
            NotificationCommands::Read { id } => commands::notification_read(&session, id).await,
        },

        Commands::Mock { command } => match command {
            MockCommands::InitObligations => commands::mock_init_obligations(&session).await,
            MockCommands::ScheduleNotifications => {
                commands::mock_schedule_notifications(&session).await
            }
        },

        Commands::Config { .. } => unreachable!("handled above"),
    }
}
