use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub payments: PaymentConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub session: SessionConfig,
}

/// Catalog provider (headless CMS) configuration
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub project_id: String,
    pub dataset: String,
    pub token: Option<String>,
}

/// Payment gateway configuration
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub api_key: String,
    pub base_url: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

/// Session/store configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Key the store snapshot persists under.
    pub storage_key: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let catalog = CatalogConfig {
            base_url: env::var("CATALOG_BASE_URL")
                .unwrap_or_else(|_| "https://api.sanity.io".to_string()),
            project_id: env::var("CATALOG_PROJECT_ID").map_err(|_| AppError::Config {
                message: "CATALOG_PROJECT_ID is required".to_string(),
            })?,
            dataset: env::var("CATALOG_DATASET").unwrap_or_else(|_| "production".to_string()),
            token: env::var("CATALOG_API_TOKEN").ok(),
        };

        let payments = PaymentConfig {
            api_key: env::var("PAYMENT_API_KEY").map_err(|_| AppError::Config {
                message: "PAYMENT_API_KEY is required".to_string(),
            })?,
            base_url: env::var("PAYMENT_BASE_URL")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            success_url: env::var("CHECKOUT_SUCCESS_URL")
                .unwrap_or_else(|_| "http://localhost:3000/success".to_string()),
            cancel_url: env::var("CHECKOUT_CANCEL_URL")
                .unwrap_or_else(|_| "http://localhost:3000/".to_string()),
        };

        let database = DatabaseConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/vora.db".to_string()),
            ),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30000),
            max_retries: env::var("MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            retry_delay_ms: env::var("RETRY_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
        };

        let session = SessionConfig {
            storage_key: env::var("STORAGE_KEY").unwrap_or_else(|_| "vora-storage".to_string()),
        };

        Ok(Config {
            catalog,
            payments,
            database,
            logging,
            request,
            session,
        })
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: "vora-storage".to_string(),
        }
    }
}
