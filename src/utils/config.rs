use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Utc};

use crate::models::EntryFormat;

pub const DEFAULT_BHAV_URL_PREFIX: &str = "http://www.bseindia.com/download/BhavCopy/Equity/EQ";
pub const DEFAULT_FIRST_RUN: &str = "2017-12-28T17:29:00Z";

pub struct ServerConfig {
    pub addr: SocketAddr,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StorageBackend::Postgres),
            "memory" | "mem" => Ok(StorageBackend::Memory),
            other => Err(format!("未知的存储后端: {other}")),
        }
    }
}

pub struct StoreConfig {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
    pub pool_size: u32,
    pub timeout: Duration,
}

pub struct IngestConfig {
    pub url_prefix: String,
    pub fetch_timeout: Duration,
    pub first_run: DateTime<Utc>,
    pub interval: Duration,
    pub entry_format: EntryFormat,
}

pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub ingest: IngestConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = parse_or(&lookup, "PORT", 8001)?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("Invalid HOST/PORT: {host}:{port}"))?;
        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        let backend: StorageBackend = parse_or(&lookup, "STORAGE_BACKEND", StorageBackend::Postgres)?;
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        if backend == StorageBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL not set (required when STORAGE_BACKEND=postgres)");
        }
        let pool_size: u32 = parse_or(&lookup, "DB_POOL_SIZE", 10)?;
        let store_timeout: u64 = parse_or(&lookup, "STORE_TIMEOUT_SECS", 5)?;

        let fetch_timeout: u64 = parse_or(&lookup, "FETCH_TIMEOUT_SECS", 60)?;
        let interval: u64 = parse_or(&lookup, "INGEST_INTERVAL_SECS", 86_400)?;
        if interval == 0 {
            bail!("INGEST_INTERVAL_SECS must be positive");
        }
        let first_run_raw = lookup("INGEST_FIRST_RUN").unwrap_or_else(|| DEFAULT_FIRST_RUN.to_string());
        let first_run = DateTime::parse_from_rfc3339(first_run_raw.trim())
            .with_context(|| format!("Invalid INGEST_FIRST_RUN: {first_run_raw}"))?
            .with_timezone(&Utc);
        let entry_format: EntryFormat = parse_or(&lookup, "INDEX_ENTRY_FORMAT", EntryFormat::V1)?;

        Ok(Self {
            server: ServerConfig {
                addr,
                allowed_origins,
            },
            store: StoreConfig {
                backend,
                database_url,
                pool_size,
                timeout: Duration::from_secs(store_timeout),
            },
            ingest: IngestConfig {
                url_prefix: lookup("BHAV_URL_PREFIX").unwrap_or_else(|| DEFAULT_BHAV_URL_PREFIX.to_string()),
                fetch_timeout: Duration::from_secs(fetch_timeout),
                first_run,
                interval: Duration::from_secs(interval),
                entry_format,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("Invalid {key}={raw}: {e}")),
        _ => Ok(default),
    }
}
