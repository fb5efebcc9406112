//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `VIVAHART_API_BASE_URL` - Backend REST base URL (e.g. `https://host/api/`)
//! - `RAZORPAY_KEY_ID` - Payment gateway public key id
//!
//! ## Optional
//! - `VIVAHART_STORAGE_PATH` - Durable storage file (default: `.vivahart/storage.json`)
//! - `VIVAHART_CATEGORY_ID` - Category shown by the category browser
//! - `VIVAHART_STORE_NAME` - Name shown in the payment widget (default: Vivah Art Studio)
//! - `VIVAHART_CURRENCY` - ISO 4217 currency code (default: INR)
//! - `VIVAHART_REQUEST_TIMEOUT_SECS` - Backend request timeout (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate, 0.0 to 1.0 (default: 1.0)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;
use vivahart_core::{CategoryId, CurrencyCode};

/// Category id of the rakhi collection in the production catalog.
pub const DEFAULT_CATEGORY_ID: &str = "686ee620362a1457eb452471";

const DEFAULT_STORAGE_PATH: &str = ".vivahart/storage.json";
const DEFAULT_STORE_NAME: &str = "Vivah Art Studio";
const DEFAULT_THEME_COLOR: &str = "#800080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend REST base URL, always ending in `/`
    pub api_base_url: Url,
    /// File backing the durable client storage
    pub storage_path: PathBuf,
    /// Category listed by the category browser
    pub category_id: CategoryId,
    /// Timeout applied to every backend request
    pub request_timeout: Duration,
    /// Payment widget configuration
    pub payment: PaymentConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
}

/// Payment widget configuration.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Gateway public key id (safe to expose to the widget)
    pub key_id: String,
    /// Merchant name shown in the widget
    pub store_name: String,
    /// Currency every order is charged in
    pub currency: CurrencyCode,
    /// Widget theme color
    pub theme_color: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(
            "VIVAHART_API_BASE_URL",
            &get_required_env("VIVAHART_API_BASE_URL")?,
        )?;
        let storage_path = PathBuf::from(get_env_or_default(
            "VIVAHART_STORAGE_PATH",
            DEFAULT_STORAGE_PATH,
        ));
        let category_id =
            CategoryId::new(get_env_or_default("VIVAHART_CATEGORY_ID", DEFAULT_CATEGORY_ID));
        let timeout_secs = get_env_or_default(
            "VIVAHART_REQUEST_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("VIVAHART_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
        })?;
        let sentry_sample_rate = get_env_or_default("SENTRY_SAMPLE_RATE", "1.0")
            .parse::<f32>()
            .map_err(|e| ConfigError::InvalidEnvVar("SENTRY_SAMPLE_RATE".to_string(), e.to_string()))?;

        Ok(Self {
            api_base_url,
            storage_path,
            category_id,
            request_timeout: Duration::from_secs(timeout_secs),
            payment: PaymentConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
        })
    }

    /// Build a configuration in code, with defaults for everything but the
    /// backend URL and storage location.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_base_url` is not a valid
    /// absolute URL.
    pub fn new(api_base_url: &str, storage_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url("api_base_url", api_base_url)?,
            storage_path: storage_path.into(),
            category_id: CategoryId::new(DEFAULT_CATEGORY_ID),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            payment: PaymentConfig {
                key_id: "rzp_test_local".to_string(),
                store_name: DEFAULT_STORE_NAME.to_string(),
                currency: CurrencyCode::INR,
                theme_color: DEFAULT_THEME_COLOR.to_string(),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
        })
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let key_id = get_required_env("RAZORPAY_KEY_ID")?;
        validate_key_id(&key_id, "RAZORPAY_KEY_ID")?;

        let currency = get_env_or_default("VIVAHART_CURRENCY", "INR")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("VIVAHART_CURRENCY".to_string(), e))?;

        Ok(Self {
            key_id,
            store_name: get_env_or_default("VIVAHART_STORE_NAME", DEFAULT_STORE_NAME),
            currency,
            theme_color: DEFAULT_THEME_COLOR.to_string(),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse the backend base URL, forcing a trailing slash so relative endpoint
/// paths join underneath it instead of replacing the last segment.
fn parse_base_url(var_name: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Reject gateway key ids that are obviously copied from a template.
fn validate_key_id(key_id: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = key_id.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InvalidEnvVar(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    if !lower.starts_with("rzp_") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must start with 'rzp_'".to_string(),
        ));
    }

    Ok(())
}
