//! API configuration
//!
//! Defaults are layered under `API_`-prefixed environment variables, e.g.
//! `API_PORT=9000` or `API_GATEWAY_URL=https://payments.example.com/api`.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for admin authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    pub database_max_connections: u32,
    /// Log level
    pub log_level: String,
    /// Payment gateway base URL (`/initiate` is appended)
    pub gateway_url: String,
    /// Payment verification base URL (`/verify` is appended)
    pub verification_url: String,
    /// Insurer API base URL (`/policies` is appended)
    pub insurer_url: String,
    pub insurer_api_key: Option<String>,
    /// Per-request timeout for the external services
    pub http_timeout_secs: u64,
    /// Idle lifetime of a checkout session
    pub session_ttl_secs: u64,
    /// Sales tax included in the quoted amount, in percent
    pub tax_rate_percent: Decimal,
    pub admin_username: String,
    /// Admin login is disabled while this is empty
    pub admin_password: String,
    /// Browser origin allowed to call the API with credentials
    pub allowed_origin: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/travel_checkout".to_string(),
            database_max_connections: 10,
            log_level: "info".to_string(),
            gateway_url: "http://localhost:4000/api/payments".to_string(),
            verification_url: "http://localhost:4000/api/payments".to_string(),
            insurer_url: "http://localhost:4100/api".to_string(),
            insurer_api_key: None,
            http_timeout_secs: 30,
            session_ttl_secs: 30 * 60,
            tax_rate_percent: Decimal::from(16),
            admin_username: "admin".to_string(),
            admin_password: String::new(),
            allowed_origin: None,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from the environment on top of the defaults
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Config::try_from(&ApiConfig::default())?)
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}
