use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

const DEFAULT_READERS: usize = 4;

#[derive(Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub db_readers: usize,
    pub host: String,
    pub port: u16,
    pub admin_token: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("db_path", &self.db_path)
            .field("db_readers", &self.db_readers)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("admin_token", &"<redacted>")
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup (the process environment in
    /// production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let admin_token = lookup("WARDEN_ADMIN_TOKEN").unwrap_or_default();
        if admin_token.trim().is_empty() {
            bail!("WARDEN_ADMIN_TOKEN must be set");
        }

        let db_readers = match lookup("WARDEN_DB_READERS") {
            Some(raw) => raw
                .parse::<usize>()
                .with_context(|| format!("invalid WARDEN_DB_READERS: {raw}"))?
                .max(1),
            None => DEFAULT_READERS,
        };

        let port: u16 = match lookup("WARDEN_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid WARDEN_PORT: {raw}"))?,
            None => 3100,
        };

        Ok(Self {
            db_path: lookup("WARDEN_DB_PATH")
                .unwrap_or_else(|| "warden.db".into())
                .into(),
            db_readers,
            host: lookup("WARDEN_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            admin_token,
        })
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
