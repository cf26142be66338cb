use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub server_addr: String,
    /// seconds
    pub access_token_ttl: usize,
    /// seconds
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    /// Lets `POST /auth/register` create admin accounts.
    pub allow_admin_signup: bool,

    pub log_dir: String,
    pub log_level: tracing::Level,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{} must be set", key))
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value {:?}: {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < 16 {
            anyhow::bail!("JWT_SECRET must be at least 16 characters");
        }

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: required("DATABASE_URL")?,
            database_max_connections: parsed("DATABASE_MAX_CONNECTIONS", 10)?,
            jwt_secret,
            access_token_ttl: parsed("ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: parsed("REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: parsed("RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: parsed("RATE_REGISTER_PER_MIN", 30)?,
            rate_refresh_per_min: parsed("RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: parsed("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            allow_admin_signup: parsed("ALLOW_ADMIN_SIGNUP", false)?,

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: parsed("LOG_LEVEL", tracing::Level::DEBUG)?,
        })
    }
}
