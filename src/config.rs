use std::env;

use anyhow::{Context, Result};
use url::Url;

use crate::db::DEFAULT_MAX_POOL_SIZE;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_pool_size: u32,
    pub server_host: String,
    pub server_port: u16,
    pub cors_allowed_origin: Option<String>,
}

/// Connection parts read from the libpq-style `PG*` variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseParts {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for DatabaseParts {
    fn default() -> Self {
        Self {
            host: "db".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            database: "vessels_db".to_string(),
        }
    }
}

impl DatabaseParts {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let port = match env::var("PGPORT") {
            Ok(value) => value.parse().context("PGPORT must be a valid u16")?,
            Err(_) => defaults.port,
        };
        Ok(Self {
            host: env::var("PGHOST").unwrap_or(defaults.host),
            port,
            user: env::var("PGUSER").unwrap_or(defaults.user),
            password: env::var("PGPASSWORD").unwrap_or(defaults.password),
            database: env::var("PGDATABASE").unwrap_or(defaults.database),
        })
    }

    pub fn to_url(&self) -> Result<String> {
        let mut url = Url::parse("postgres://localhost").context("invalid base database url")?;
        url.set_host(Some(&self.host))
            .with_context(|| format!("invalid database host {}", self.host))?;
        url.set_port(Some(self.port))
            .map_err(|_| anyhow::anyhow!("database url cannot carry a port"))?;
        url.set_username(&self.user)
            .map_err(|_| anyhow::anyhow!("database url cannot carry a username"))?;
        url.set_password(Some(&self.password))
            .map_err(|_| anyhow::anyhow!("database url cannot carry a password"))?;
        url.set_path(&format!("/{}", self.database));
        Ok(url.to_string())
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = match env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => DatabaseParts::from_env()?.to_url()?,
        };
        let database_max_pool_size = env::var("DATABASE_MAX_POOL_SIZE")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_MAX_POOL_SIZE);
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .context("SERVER_PORT must be a valid u16")?;
        let cors_allowed_origin = env::var("CORS_ALLOWED_ORIGIN").ok();

        Ok(Self {
            database_url,
            database_max_pool_size,
            server_host,
            server_port,
            cors_allowed_origin,
        })
    }

    pub fn redacted_database_url(&self) -> String {
        redact_database_url(&self.database_url)
    }
}

fn redact_database_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("*****"));
            }
            parsed.to_string()
        }
        Err(_) => "***".to_string(),
    }
}
