//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. The file path defaults to `config.yaml` and can be set via
//! `-f` flag or `STOCKROOM_CONFIG`.
//!
//! Sources are merged in order, later overriding earlier:
//!
//! 1. YAML config file
//! 2. Environment variables prefixed with `STOCKROOM_` (double underscore
//!    for nesting, e.g. `STOCKROOM_NOTIFICATIONS__SCAN_INTERVAL=1h`)
//! 3. `DATABASE_URL`, overriding `database_url`

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "STOCKROOM_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Root configuration. All fields have defaults so an empty file is valid.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// SQLite connection string, e.g. `sqlite://stockroom.db?mode=rwc`
    pub database_url: String,
    /// Username for the initial admin user (created on first startup)
    pub admin_username: String,
    /// Email address for the initial admin user
    pub admin_email: String,
    /// Password for the initial admin user; when unset no admin is seeded
    pub admin_password: Option<String>,
    /// How long a login session stays valid
    #[serde(with = "humantime_serde")]
    pub session_ttl: Duration,
    /// Background notification scan tuning
    pub notifications: NotificationsConfig,
    /// Outgoing email; when absent, notifications stay in-app only
    pub email: Option<EmailConfig>,
    /// Log every request via tower-http trace layer
    pub enable_request_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            database_url: "sqlite://stockroom.db?mode=rwc".to_string(),
            admin_username: "admin".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: None,
            session_ttl: Duration::from_secs(24 * 60 * 60),
            notifications: NotificationsConfig::default(),
            email: None,
            enable_request_logging: true,
        }
    }
}

/// Scheduling for the periodic low-stock and expiration scans.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotificationsConfig {
    /// How often both background scans run
    #[serde(with = "humantime_serde")]
    pub scan_interval: Duration,
    /// Minimum gap between repeated low-stock alerts for the same resource
    /// and recipient from the periodic scan. Slightly under a day so a daily
    /// scan is not skipped by scheduling jitter.
    #[serde(with = "humantime_serde")]
    pub low_stock_throttle: Duration,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(24 * 60 * 60),
            low_stock_throttle: Duration::from_secs(23 * 60 * 60 + 30 * 60),
        }
    }
}

/// Email configuration for notification delivery.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
// Note: Cannot use deny_unknown_fields here due to #[serde(flatten)] on transport
pub struct EmailConfig {
    /// Email transport method
    #[serde(flatten)]
    pub transport: EmailTransportConfig,
    /// Sender email address
    pub from_email: String,
    /// Sender display name
    pub from_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            transport: EmailTransportConfig::File {
                path: "/tmp/stockroom-emails".to_string(),
            },
            from_email: "noreply@example.com".to_string(),
            from_name: "Stockroom".to_string(),
        }
    }
}

/// Email transport configuration - either SMTP or file-based for testing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EmailTransportConfig {
    /// Send emails via SMTP server
    Smtp {
        host: String,
        port: u16,
        username: String,
        password: String,
        use_tls: bool,
    },
    /// Write emails to files (for development/testing)
    File { path: String },
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        Self::figment(args).extract()
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("STOCKROOM_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
