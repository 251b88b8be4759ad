use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub auth: AuthConfig,

    pub security: SecurityConfig,

    pub mail: MailConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/edhub.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_allowed_origins: vec![
                "http://localhost:8000".to_string(),
                "http://127.0.0.1:8000".to_string(),
            ],
        }
    }
}

/// Token, OTP and attempt-limit policy.
///
/// The signing secrets are deliberately not part of the serialized form:
/// they are read from the environment in [`Config::load`] so they never end
/// up in a config file on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Access-token lifetime in minutes.
    pub access_token_expire_minutes: i64,

    /// Refresh-token lifetime in minutes (default: 6 months).
    pub refresh_token_expire_minutes: i64,

    /// Minutes before an issued OTP expires.
    pub otp_expire_minutes: i64,

    /// Max combined issuance + failed-verification events for phone OTPs.
    pub max_phone_otp_attempts: i32,

    /// Max combined issuance + failed-verification events for email OTPs.
    pub max_email_otp_attempts: i32,

    /// Max combined issuance + failed-verification events for web OTPs.
    pub max_web_otp_attempts: i32,

    /// Max failed organization-join attempts before the endpoint locks out.
    pub max_activation_attempts: i32,

    /// Demo account that bypasses the email-OTP equality check.
    /// Empty string disables the bypass.
    pub demo_bypass_email: String,

    /// Guest account that always receives `guest_otp` instead of a random
    /// code. Empty string disables the carve-out.
    pub guest_email: String,

    /// Fixed code issued to `guest_email`.
    pub guest_otp: String,

    /// Signing secret for the standard (student/teacher) token domain.
    /// Sourced from EDHUB_JWT_SECRET, never from the config file.
    #[serde(skip)]
    pub jwt_secret: Option<String>,

    /// Signing secret for the admin token domain.
    /// Sourced from EDHUB_JWT_ADMIN_SECRET, never from the config file.
    #[serde(skip)]
    pub jwt_admin_secret: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_expire_minutes: 30,
            refresh_token_expire_minutes: 60 * 24 * 180,
            otp_expire_minutes: 10,
            max_phone_otp_attempts: 20,
            max_email_otp_attempts: 100,
            max_web_otp_attempts: 100,
            max_activation_attempts: 100,
            demo_bypass_email: "ycdemo@letsevolve.in".to_string(),
            guest_email: "guest@letsevolve.in".to_string(),
            guest_otp: "071123".to_string(),
            jwt_secret: None,
            jwt_admin_secret: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations) - higher = more CPU work
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub enabled: bool,

    /// Transactional mail HTTP API endpoint.
    pub api_url: String,

    pub from_address: String,

    pub from_name: String,

    /// API key for the mail provider.
    /// Sourced from EDHUB_MAIL_API_KEY, never from the config file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "https://api.brevo.com/v3/smtp/email".to_string(),
            from_address: "support@edhub.app".to_string(),
            from_name: "Edhub Support".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            security: SecurityConfig::default(),
            mail: MailConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                let mut config = Self::load_from_path(path)?;
                config.load_secrets_from_env();
                return Ok(config);
            }
        }

        info!("No config file found, using defaults");
        let mut config = Self::default();
        config.load_secrets_from_env();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Signing keys and the mail API key only ever come from the process
    /// environment (a .env file is honored via dotenvy in `run()`).
    pub fn load_secrets_from_env(&mut self) {
        self.auth.jwt_secret = std::env::var("EDHUB_JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty());
        self.auth.jwt_admin_secret = std::env::var("EDHUB_JWT_ADMIN_SECRET")
            .ok()
            .filter(|s| !s.is_empty());
        self.mail.api_key = std::env::var("EDHUB_MAIL_API_KEY")
            .ok()
            .filter(|s| !s.is_empty());
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_none() {
            anyhow::bail!("EDHUB_JWT_SECRET is not set; tokens cannot be issued");
        }

        if self.auth.jwt_admin_secret.is_none() {
            anyhow::bail!("EDHUB_JWT_ADMIN_SECRET is not set; admin tokens cannot be issued");
        }

        if self.mail.enabled && self.mail.api_key.is_none() {
            anyhow::bail!("Mail delivery is enabled but EDHUB_MAIL_API_KEY is not set");
        }

        if self.auth.otp_expire_minutes <= 0 {
            anyhow::bail!("auth.otp_expire_minutes must be > 0");
        }

        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("edhub").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".edhub").join("config.toml"));
        }

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let config = Config::default();
        assert_eq!(config.auth.max_phone_otp_attempts, 20);
        assert_eq!(config.auth.max_email_otp_attempts, 100);
        assert_eq!(config.auth.max_web_otp_attempts, 100);
        assert_eq!(config.auth.max_activation_attempts, 100);
        assert_eq!(config.auth.otp_expire_minutes, 10);
    }

    #[test]
    fn secrets_never_serialize() {
        let mut config = Config::default();
        config.auth.jwt_secret = Some("super-secret".to_string());
        config.mail.api_key = Some("mail-key".to_string());

        let serialized = toml::to_string(&config).unwrap();
        assert!(!serialized.contains("super-secret"));
        assert!(!serialized.contains("mail-key"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.max_phone_otp_attempts, 20);
    }
}
