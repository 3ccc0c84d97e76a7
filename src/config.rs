use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context;

use crate::paths;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "dev" | "development" => Ok(AppEnv::Development),
            "prod" | "production" => Ok(AppEnv::Production),
            other => Err(format!("unknown APP_ENV {other:?}")),
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub app_env: AppEnv,
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub db_connection_string: String,
    pub remote_base_url: Option<String>,
    pub remote_api_key: String,
    pub sync_interval: Duration,
}

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;
const DEFAULT_DEV_REMOTE_BASE_URL: &str = "http://localhost:3001";

/// An explicit REMOTE_BASE_URL always wins; otherwise development talks to a
/// local remote store and production has sync disabled.
pub fn select_remote_base_url(app_env: AppEnv, explicit: Option<String>) -> Option<String> {
    match explicit.filter(|u| !u.trim().is_empty()) {
        Some(url) => Some(url.trim().to_string()),
        None => match app_env {
            AppEnv::Development => Some(DEFAULT_DEV_REMOTE_BASE_URL.into()),
            AppEnv::Production => None,
        },
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let app_env = lookup("APP_ENV")
            .unwrap_or_default()
            .parse::<AppEnv>()
            .map_err(anyhow::Error::msg)?;
        let bind_addr = lookup("BIND_ADDR").unwrap_or(DEFAULT_BIND_ADDR.into());
        let data_dir = PathBuf::from(lookup("DATA_DIR").unwrap_or(DEFAULT_DATA_DIR.into()));
        let db_connection_string = lookup("DB_CONNECTION_STRING")
            .unwrap_or_else(|| paths::default_db_connection_string(&data_dir));
        let remote_base_url = select_remote_base_url(app_env, lookup("REMOTE_BASE_URL"));
        let remote_api_key = lookup("REMOTE_API_KEY").unwrap_or_default();
        let sync_interval_secs = match lookup("SYNC_INTERVAL_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid SYNC_INTERVAL_SECS: {}", raw))?,
            None => DEFAULT_SYNC_INTERVAL_SECS,
        };
        Ok(Config {
            app_env,
            bind_addr,
            data_dir,
            db_connection_string,
            remote_base_url,
            remote_api_key,
            sync_interval: Duration::from_secs(sync_interval_secs),
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.bind_addr.parse::<SocketAddr>().is_err() {
            return Err(format!("BIND_ADDR {:?} is not a socket address", self.bind_addr));
        }
        if self.db_connection_string.is_empty() {
            return Err("DB_CONNECTION_STRING is empty".into());
        }
        if self.sync_interval.is_zero() {
            return Err("SYNC_INTERVAL_SECS must be greater than 0".into());
        }
        if let Some(url) = &self.remote_base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("REMOTE_BASE_URL {url:?} must be an http(s) URL"));
            }
        }
        Ok(())
    }
}
