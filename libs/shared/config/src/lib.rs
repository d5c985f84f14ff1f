use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_CLINIC_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_SESSION_FILE: &str = ".clinic-session.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub clinic_api_url: String,
    pub request_timeout_seconds: u64,
    pub session_file: PathBuf,
    pub queue_poll_seconds: u64,
    /// Gateway live-queue pollers nobody viewed for this long are stopped.
    pub queue_idle_seconds: u64,
    pub queue_max_watched: usize,
    pub queue_days_ahead: u64,
    pub token_poll_seconds: u64,
    pub slot_poll_seconds: u64,
    pub window_refresh_seconds: u64,
    pub geofence_radius_km: f64,
    pub bind_addr: SocketAddr,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            clinic_api_url: DEFAULT_CLINIC_API_URL.to_string(),
            request_timeout_seconds: 10,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            queue_poll_seconds: 7,
            queue_idle_seconds: 300,
            queue_max_watched: 200,
            queue_days_ahead: 30,
            token_poll_seconds: 10,
            slot_poll_seconds: 20,
            window_refresh_seconds: 30,
            geofence_radius_km: 1.0,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            clinic_api_url: env::var("CLINIC_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("CLINIC_API_URL not set, using {}", DEFAULT_CLINIC_API_URL);
                    String::new()
                }),
            request_timeout_seconds: parse_var("CLINIC_API_TIMEOUT_SECONDS", defaults.request_timeout_seconds),
            session_file: env::var("SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),
            queue_poll_seconds: parse_var("QUEUE_POLL_SECONDS", defaults.queue_poll_seconds),
            queue_idle_seconds: parse_var("QUEUE_IDLE_SECONDS", defaults.queue_idle_seconds),
            queue_max_watched: parse_var("QUEUE_MAX_WATCHED", defaults.queue_max_watched),
            queue_days_ahead: parse_var("QUEUE_DAYS_AHEAD", defaults.queue_days_ahead),
            token_poll_seconds: parse_var("TOKEN_POLL_SECONDS", defaults.token_poll_seconds),
            slot_poll_seconds: parse_var("SLOT_POLL_SECONDS", defaults.slot_poll_seconds),
            window_refresh_seconds: parse_var("WINDOW_REFRESH_SECONDS", defaults.window_refresh_seconds),
            geofence_radius_km: parse_var("GEOFENCE_RADIUS_KM", defaults.geofence_radius_km),
            bind_addr: parse_var("BIND_ADDR", defaults.bind_addr),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    /// Builds a config pointing at an explicit backend, everything else default.
    pub fn with_api_url(url: impl Into<String>) -> Self {
        Self {
            clinic_api_url: url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.clinic_api_url.is_empty()
    }

    /// Backend base URL, falling back to the local development server.
    pub fn api_base_url(&self) -> &str {
        if self.clinic_api_url.is_empty() {
            DEFAULT_CLINIC_API_URL
        } else {
            &self.clinic_api_url
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1))
    }

    pub fn queue_poll_interval(&self) -> Duration {
        Duration::from_secs(self.queue_poll_seconds.max(1))
    }

    pub fn queue_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.queue_idle_seconds.max(1))
    }

    pub fn token_poll_interval(&self) -> Duration {
        Duration::from_secs(self.token_poll_seconds.max(1))
    }

    pub fn slot_poll_interval(&self) -> Duration {
        Duration::from_secs(self.slot_poll_seconds.max(1))
    }

    pub fn window_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.window_refresh_seconds.max(1))
    }
}

fn parse_var<T: FromStr + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
