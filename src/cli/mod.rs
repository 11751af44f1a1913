//! CLI argument definitions for Pilotage.

use clap::{Parser, Subcommand};

/// Pilotage - command-line client for the Pilotage Micro API.
///
/// Authenticate with `pm login`, then inspect your activity with
/// `pm dashboard`, `pm invoice list` and friends.
#[derive(Parser, Debug)]
#[command(name = "pm")]
#[command(author, version, about = "A CLI client for the Pilotage Micro API", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Backend base URL (e.g. http://localhost:8001).
    /// Can also be set via PM_API_URL or config.kdl.
    #[arg(long = "api-url", global = true, env = "PM_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an account and open a session
    Register {
        /// Account email address
        email: String,
        /// Account password
        password: String,
        /// First name
        first_name: String,
        /// Last name
        last_name: String,
    },

    /// Authenticate and open a session
    Login {
        /// Account email address
        email: String,
        /// Account password
        password: String,
    },

    /// End the current session and forget the stored token
    Logout,

    /// Show the currently authenticated user (resumes the saved session)
    Whoami,

    /// Fiscal profile commands (onboarding data)
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Invoice commands
    Invoice {
        #[command(subcommand)]
        command: InvoiceCommands,
    },

    /// Client (customer) commands
    Client {
        #[command(subcommand)]
        command: ClientCommands,
    },

    /// Show revenue against the micro-entrepreneur and VAT thresholds
    Dashboard,

    /// Notification commands
    Notifications {
        #[command(subcommand)]
        command: NotificationCommands,
    },

    /// Demo-data helpers exposed by the backend
    Mock {
        #[command(subcommand)]
        command: MockCommands,
    },

    /// Local configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Fiscal profile subcommands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Show the fiscal profile
    Show,

    /// Create the fiscal profile (completes onboarding)
    Create {
        /// Activity type: BIC or BNC
        #[arg(long)]
        activity_type: String,

        /// URSSAF declaration periodicity: monthly or quarterly
        #[arg(long)]
        urssaf_periodicity: String,

        /// VAT regime: franchise, simplified or real
        #[arg(long)]
        vat_regime: String,

        /// Micro-entrepreneur revenue threshold in euros
        #[arg(long, default_value_t = 77_700.0)]
        micro_threshold: f64,

        /// VAT franchise threshold in euros
        #[arg(long, default_value_t = 36_800.0)]
        vat_threshold: f64,

        /// Previous year turnover in euros
        #[arg(long)]
        previous_year_turnover: Option<f64>,
    },

    /// Update the fiscal profile
    Update {
        /// Activity type: BIC or BNC
        #[arg(long)]
        activity_type: String,

        /// URSSAF declaration periodicity: monthly or quarterly
        #[arg(long)]
        urssaf_periodicity: String,

        /// VAT regime: franchise, simplified or real
        #[arg(long)]
        vat_regime: String,

        /// Micro-entrepreneur revenue threshold in euros
        #[arg(long, default_value_t = 77_700.0)]
        micro_threshold: f64,

        /// VAT franchise threshold in euros
        #[arg(long, default_value_t = 36_800.0)]
        vat_threshold: f64,

        /// Previous year turnover in euros
        #[arg(long)]
        previous_year_turnover: Option<f64>,
    },
}

/// Invoice subcommands
#[derive(Subcommand, Debug)]
pub enum InvoiceCommands {
    /// List invoices (most recent first)
    List,

    /// Create an invoice (numbering and VAT are computed server-side)
    Create {
        /// Client name
        #[arg(long)]
        client_name: String,

        /// Client email address
        #[arg(long)]
        client_email: String,

        /// Client postal address
        #[arg(long)]
        client_address: String,

        /// Pre-tax amount in euros
        #[arg(long)]
        amount_ht: f64,

        /// Description of the billed work
        #[arg(long)]
        description: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due_date: Option<String>,
    },

    /// Update an invoice's status
    Status {
        /// Invoice ID
        id: String,

        /// New status: draft, sent, paid or overdue
        status: String,
    },

    /// Download an invoice's PDF
    Pdf {
        /// Invoice ID
        id: String,

        /// Output file (defaults to <invoice-id>.pdf)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
}

/// Client subcommands
#[derive(Subcommand, Debug)]
pub enum ClientCommands {
    /// List clients
    List,

    /// Add a client
    Add {
        /// Client name
        #[arg(long)]
        name: String,

        /// Client email address
        #[arg(long)]
        email: String,

        /// Client postal address
        #[arg(long)]
        address: String,

        /// SIRET number
        #[arg(long)]
        siret: Option<String>,

        /// Phone number
        #[arg(long)]
        phone: Option<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
}

/// Notification subcommands
#[derive(Subcommand, Debug)]
pub enum NotificationCommands {
    /// List notifications
    List,

    /// Mark a notification as read
    Read {
        /// Notification ID
        id: String,
    },
}

/// Demo-data subcommands
#[derive(Subcommand, Debug)]
pub enum MockCommands {
    /// Seed URSSAF/VAT obligations matching the fiscal profile
    InitObligations,

    /// Schedule reminder notifications for upcoming deadlines
    ScheduleNotifications,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Set the backend base URL in config.kdl
    SetUrl {
        /// Backend base URL
        url: String,
    },
}
