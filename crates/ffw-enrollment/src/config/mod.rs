use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::organization::OrganizationProfile;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub assets: AssetConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let content_root = env::var("APP_CONTENT_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        let logo_path = non_empty_var("APP_LOGO_PATH").map(PathBuf::from);

        let smtp_port = env::var("MAIL_SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidMailPort)?;
        let timeout_secs = env::var("MAIL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidTimeout)?;

        let mail = MailConfig {
            smtp_server: non_empty_var("MAIL_SMTP_SERVER"),
            smtp_port,
            sender: non_empty_var("MAIL_SENDER"),
            sender_name: non_empty_var("MAIL_SENDER_NAME")
                .unwrap_or_else(|| "Feuerwehr Anmeldung".to_string()),
            password: non_empty_var("MAIL_PASSWORD"),
            recipient: non_empty_var("MAIL_RECIPIENT").unwrap_or_else(|| {
                OrganizationProfile::apfeltrang()
                    .mailbox
                    .to_ascii_lowercase()
            }),
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            assets: AssetConfig {
                content_root,
                logo_path,
            },
            mail,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the renderer looks for decorative assets.
#[derive(Debug, Clone)]
pub struct AssetConfig {
    pub content_root: PathBuf,
    pub logo_path: Option<PathBuf>,
}

/// Outbound SMTP settings. Missing server, sender or password leaves delivery disabled.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_server: Option<String>,
    pub smtp_port: u16,
    pub sender: Option<String>,
    pub sender_name: String,
    pub password: Option<String>,
    pub recipient: String,
    pub timeout: Duration,
}

impl MailConfig {
    pub fn is_complete(&self) -> bool {
        self.smtp_server.is_some() && self.sender.is_some() && self.password.is_some()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidMailPort,
    InvalidTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidMailPort => write!(f, "MAIL_SMTP_PORT must be a valid u16"),
            ConfigError::InvalidTimeout => {
                write!(f, "MAIL_TIMEOUT_SECS must be a positive number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidMailPort
            | ConfigError::InvalidTimeout => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_CONTENT_ROOT",
            "APP_LOGO_PATH",
            "MAIL_SMTP_SERVER",
            "MAIL_SMTP_PORT",
            "MAIL_SENDER",
            "MAIL_SENDER_NAME",
            "MAIL_PASSWORD",
            "MAIL_RECIPIENT",
            "MAIL_TIMEOUT_SECS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.assets.content_root, PathBuf::from("."));
        assert!(config.assets.logo_path.is_none());
        assert_eq!(config.mail.smtp_port, 587);
        assert_eq!(config.mail.sender_name, "Feuerwehr Anmeldung");
        assert_eq!(config.mail.recipient, "vorstand@ff-apfeltrang.de");
        assert_eq!(config.mail.timeout, Duration::from_secs(30));
        assert!(!config.mail.is_complete());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn mail_settings_complete_when_server_sender_and_password_present() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MAIL_SMTP_SERVER", "smtp.example.org");
        env::set_var("MAIL_SENDER", "anmeldung@example.org");
        env::set_var("MAIL_PASSWORD", "secret");
        env::set_var("MAIL_SMTP_PORT", "465");
        let config = AppConfig::load().expect("config loads");
        assert!(config.mail.is_complete());
        assert_eq!(config.mail.smtp_port, 465);
        reset_env();
    }

    #[test]
    fn rejects_zero_delivery_timeout() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MAIL_TIMEOUT_SECS", "0");
        let err = AppConfig::load().expect_err("zero timeout rejected");
        assert!(matches!(err, ConfigError::InvalidTimeout));
        reset_env();
    }
}
