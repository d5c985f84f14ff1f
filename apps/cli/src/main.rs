use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use shared_config::AppConfig;
use shared_utils::session::SessionStore;

#[derive(Parser)]
#[command(name = "clinicq")]
#[command(about = "Clinic appointment and live queue client")]
struct Cli {
    /// Clinic backend base URL (overrides CLINIC_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        username: String,
        #[arg(long)]
        password: String,
        /// Use the staff login (doctors and receptionists)
        #[arg(long)]
        staff: bool,
    },
    /// Create a patient account and store its session
    Register {
        username: String,
        #[arg(long)]
        password: String,
        /// Repeat the password; defaults to --password
        #[arg(long)]
        confirm_password: Option<String>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: u32,
        /// Phone number in international form (+CC...)
        #[arg(long)]
        phone: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in profile
    Whoami,
    /// Clinics and their doctors
    Clinics {
        /// Only clinics in this city
        #[arg(long)]
        city: Option<String>,
        /// Only doctors with this specialization
        #[arg(long)]
        specialization: Option<String>,
    },
    /// Doctors of your clinic (staff)
    Doctors,
    /// Bookable slots for a doctor
    Slots {
        doctor_id: i64,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Keep polling and reprint when the slots change
        #[arg(long)]
        watch: bool,
    },
    /// Compute slots for a schedule locally
    Preview {
        /// Start time (HH:MM)
        start: String,
        /// End time (HH:MM)
        end: String,
        /// Slot length in minutes
        duration: i32,
        #[arg(long)]
        max_slots: Option<i32>,
        /// Booked times (comma-separated HH:MM)
        #[arg(long)]
        booked: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Arrival confirmation window for your token, or for a given time
    Window {
        /// Appointment time (HH:MM) to check instead of your token
        #[arg(long)]
        time: Option<String>,
        /// Date of the --time appointment, defaults to today
        #[arg(long, requires = "time")]
        date: Option<NaiveDate>,
        /// Keep refreshing and reprint when the window changes
        #[arg(long)]
        watch: bool,
    },
    /// Confirm arrival at the clinic
    ConfirmArrival {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Book a slot
    Book {
        doctor_id: i64,
        /// Date (YYYY-MM-DD)
        date: NaiveDate,
        /// Slot time (HH:MM)
        time: String,
    },
    /// Cancel your active token
    Cancel,
    /// Register a walk-in or slot-bound token at the front desk
    WalkIn {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: i32,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        doctor: i64,
        /// Slot time (HH:MM); omit for a walk-in
        #[arg(long)]
        time: Option<String>,
    },
    /// List the clinic's tokens
    Tokens {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Change a token's status (confirm, skip, cancel, start, complete)
    Status {
        token_id: i64,
        action: String,
        /// Status last seen for the token
        #[arg(long)]
        current: Option<String>,
    },
    /// Follow a doctor's live queue until interrupted
    WatchQueue {
        doctor_id: i64,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Highlight this token and show how many are ahead
        #[arg(long)]
        token: Option<i64>,
        /// Poll interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(url) = cli.api_url {
        config.clinic_api_url = url.trim_end_matches('/').to_string();
    }

    let Some(command) = cli.command else {
        println!("Use 'clinicq --help' for commands");
        return Ok(());
    };

    let store = SessionStore::new(config.session_file.clone());
    let loaded = store
        .load()
        .with_context(|| format!("could not read session file {}", store.path().display()))?;
    let mut session = loaded.clone();

    let result = commands::run(command, &config, &mut session).await;

    if session != loaded {
        match &session {
            Some(session) => store.save(session),
            None => store.clear(),
        }
        .with_context(|| format!("could not update session file {}", store.path().display()))?;
    }

    result
}
