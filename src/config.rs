use anyhow::{Context, Result, bail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String, pool_size: u32 },
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backend: StoreBackend,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. `DATABASE_URL` is
    /// required; a value starting with `memory:` selects the in-process store.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got {raw:?}"))?,
            None => 8080,
        };

        let pool_size = match lookup("DB_POOL_SIZE") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("DB_POOL_SIZE must be a positive integer, got {raw:?}"))?,
            None => 10,
        };
        if pool_size == 0 {
            bail!("DB_POOL_SIZE must be at least 1");
        }

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("LOG_FORMAT must be \"text\" or \"json\", got {other:?}"),
        };

        let backend = if database_url.starts_with("memory:") {
            StoreBackend::Memory
        } else {
            StoreBackend::Postgres {
                database_url,
                pool_size,
            }
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            backend,
            log_format,
        })
    }
}
