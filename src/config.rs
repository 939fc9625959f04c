use std::env;

use anyhow::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Production,
}

impl AppEnvironment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => AppEnvironment::Development,
            _ => AppEnvironment::Production,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationBackend {
    Memory,
    Database,
}

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub environment: AppEnvironment,
    pub jwt_secret: String,
    pub login_token_ttl_hours: i64,
    pub registration_token_ttl_hours: i64,
    pub verification_ttl_secs: i64,
    pub verification_backend: VerificationBackend,
    pub phone_country_code: String,
    pub receipt_required_methods: Vec<String>,
    pub db_max_connections: u32,
    pub max_body_bytes: usize,
    pub cors_origins: Vec<String>,
    pub twilio: Option<TwilioConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000);
        let environment = env::var("APP_ENV")
            .map(|v| AppEnvironment::parse(&v))
            .unwrap_or(AppEnvironment::Production);

        let verification_backend = match env::var("VERIFICATION_STORE")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str()
        {
            "database" | "db" | "postgres" => VerificationBackend::Database,
            _ => VerificationBackend::Memory,
        };

        let twilio = match (
            env::var("TWILIO_ACCOUNT_SID"),
            env::var("TWILIO_AUTH_TOKEN"),
            env::var("TWILIO_FROM_NUMBER"),
        ) {
            (Ok(account_sid), Ok(auth_token), Ok(from_number)) => Some(TwilioConfig {
                account_sid,
                auth_token,
                from_number,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            host,
            port,
            environment,
            jwt_secret,
            login_token_ttl_hours: parse_or("LOGIN_TOKEN_TTL_HOURS", 1),
            registration_token_ttl_hours: parse_or("REGISTRATION_TOKEN_TTL_HOURS", 24),
            verification_ttl_secs: parse_or("VERIFICATION_TTL_SECS", 300),
            verification_backend,
            phone_country_code: env::var("PHONE_COUNTRY_CODE").unwrap_or_else(|_| "52".into()),
            receipt_required_methods: split_list(
                &env::var("RECEIPT_REQUIRED_METHODS").unwrap_or_else(|_| "transferencia".into()),
            ),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 10),
            max_body_bytes: parse_or("MAX_BODY_BYTES", 10 * 1024 * 1024),
            cors_origins: split_list(&env::var("CORS_ORIGINS").unwrap_or_default()),
            twilio,
        })
    }

    /// Settings suitable for tests and local tooling; only the database URL is required.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".into(),
            port: 3000,
            environment: AppEnvironment::Development,
            jwt_secret: "test-secret".into(),
            login_token_ttl_hours: 1,
            registration_token_ttl_hours: 24,
            verification_ttl_secs: 300,
            verification_backend: VerificationBackend::Memory,
            phone_country_code: "52".into(),
            receipt_required_methods: vec!["transferencia".into()],
            db_max_connections: 5,
            max_body_bytes: 10 * 1024 * 1024,
            cors_origins: Vec::new(),
            twilio: None,
        }
    }

    pub fn receipt_required(&self, payment_method: &str) -> bool {
        self.receipt_required_methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(payment_method))
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
