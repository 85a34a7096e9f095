use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::crypto::MIN_SECRET_LENGTH;

/// Application-level constants
pub const APP_NAME: &str = "Geni";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 600_000;
pub const MIN_PBKDF2_ITERATIONS: u32 = 100_000;
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 72;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Get the application data directory
/// ~/Geni/ on all platforms, falling back to ./Geni without a home directory
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default `tracing` filter when `RUST_LOG` is not set
pub fn default_log_filter() -> String {
    "geni_lib=info,tower_http=warn".to_string()
}

#[derive(Clone)]
pub struct ResendSettings {
    pub api_key: String,
    pub from: String,
}

#[derive(Clone)]
pub struct PolarSettings {
    pub access_token: String,
    pub product_id: String,
    pub api_url: Option<String>,
}

/// Runtime settings, read from `GENI_*` environment variables
#[derive(Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub data_dir: PathBuf,
    pub secret: String,
    /// Base of the emailed report links, without trailing slash
    pub public_url: String,
    pub pbkdf2_iterations: u32,
    pub token_ttl_hours: i64,
    pub http_timeout_secs: u64,
    /// `None` → emails are logged instead of sent
    pub resend: Option<ResendSettings>,
    /// `None` → only `dev_` checkouts are accepted
    pub polar: Option<PolarSettings>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind", &self.bind)
            .field("data_dir", &self.data_dir)
            .field("public_url", &self.public_url)
            .field("pbkdf2_iterations", &self.pbkdf2_iterations)
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("mail_enabled", &self.mail_enabled())
            .field("payments_enabled", &self.payments_enabled())
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name → value lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_raw = get("GENI_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "GENI_BIND",
            reason: format!("'{bind_raw}' is not a socket address"),
        })?;

        let data_dir = get("GENI_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(app_data_dir);

        let secret = get("GENI_SECRET").ok_or(ConfigError::Missing("GENI_SECRET"))?;
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::Invalid {
                name: "GENI_SECRET",
                reason: format!("must be at least {MIN_SECRET_LENGTH} bytes"),
            });
        }

        let public_url = get("GENI_PUBLIC_URL")
            .unwrap_or_else(|| format!("http://{bind}"))
            .trim_end_matches('/')
            .to_string();
        if !public_url.starts_with("http://") && !public_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: "GENI_PUBLIC_URL",
                reason: "must start with http:// or https://".into(),
            });
        }

        let pbkdf2_iterations = parse_number(
            get("GENI_PBKDF2_ITERATIONS"),
            "GENI_PBKDF2_ITERATIONS",
            DEFAULT_PBKDF2_ITERATIONS,
        )?;
        if pbkdf2_iterations < MIN_PBKDF2_ITERATIONS {
            return Err(ConfigError::Invalid {
                name: "GENI_PBKDF2_ITERATIONS",
                reason: format!("must be at least {MIN_PBKDF2_ITERATIONS}"),
            });
        }

        let token_ttl_hours = parse_number(
            get("GENI_TOKEN_TTL_HOURS"),
            "GENI_TOKEN_TTL_HOURS",
            DEFAULT_TOKEN_TTL_HOURS,
        )?;
        if !(1..=24 * 30).contains(&token_ttl_hours) {
            return Err(ConfigError::Invalid {
                name: "GENI_TOKEN_TTL_HOURS",
                reason: "must be between 1 and 720".into(),
            });
        }

        let resend = match (get("GENI_RESEND_API_KEY"), get("GENI_MAIL_FROM")) {
            (Some(api_key), Some(from)) => Some(ResendSettings { api_key, from }),
            (Some(_), None) => return Err(ConfigError::Missing("GENI_MAIL_FROM")),
            (None, _) => None,
        };

        let polar = match (get("GENI_POLAR_TOKEN"), get("GENI_POLAR_PRODUCT_ID")) {
            (Some(access_token), Some(product_id)) => Some(PolarSettings {
                access_token,
                product_id,
                api_url: get("GENI_POLAR_API_URL"),
            }),
            (Some(_), None) => return Err(ConfigError::Missing("GENI_POLAR_PRODUCT_ID")),
            (None, _) => None,
        };

        Ok(Self {
            bind,
            data_dir,
            secret,
            public_url,
            pbkdf2_iterations,
            token_ttl_hours,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            resend,
            polar,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("geni.db")
    }

    pub fn mail_enabled(&self) -> bool {
        self.resend.is_some()
    }

    pub fn payments_enabled(&self) -> bool {
        self.polar.is_some()
    }

    /// Link emailed to the purchaser
    pub fn report_link(&self, report_id: &uuid::Uuid, token: &str) -> String {
        format!("{}/reports/{report_id}#token={token}", self.public_url)
    }
}

fn parse_number<T: std::str::FromStr>(
    raw: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
            name,
            reason: format!("'{value}' is not a number"),
        }),
    }
}
