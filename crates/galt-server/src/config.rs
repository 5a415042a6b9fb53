use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use galt_api::token::DEFAULT_TTL_HOURS;

/// Placeholder secrets that must not sign real tokens.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub token_ttl: chrono::Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = var("GALT_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("GALT_JWT_SECRET is unset or still a placeholder");
        }

        let db_path = var("GALT_DB_PATH").unwrap_or_else(|| "galt.db".into()).into();
        let host = var("GALT_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("GALT_PORT")
            .unwrap_or_else(|| "8000".into())
            .parse()
            .context("GALT_PORT is not a port number")?;
        let ttl_hours: i64 = match var("GALT_TOKEN_TTL_HOURS") {
            Some(v) => v.parse().context("GALT_TOKEN_TTL_HOURS is not a number")?,
            None => DEFAULT_TTL_HOURS,
        };
        if ttl_hours <= 0 {
            bail!("GALT_TOKEN_TTL_HOURS must be positive");
        }

        let addr = format!("{}:{}", host, port)
            .parse()
            .context("GALT_HOST/GALT_PORT do not form a socket address")?;

        Ok(Self {
            jwt_secret,
            db_path,
            addr,
            token_ttl: chrono::Duration::hours(ttl_hours),
        })
    }
}
