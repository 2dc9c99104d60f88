use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{Role, UserContext};
use crate::error::RegError;
use crate::sync::{RetryPolicy, SyncOptions};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub base_url: String,
    #[serde(default)]
    pub user: Option<UserEntry>,
    #[serde(default)]
    pub sync: SyncEntry,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UserEntry {
    pub username: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub affiliates: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncEntry {
    pub insert_batch: Option<usize>,
    pub delete_batch: Option<usize>,
    pub insert_delay_ms: Option<u64>,
    pub delete_delay_ms: Option<u64>,
    pub page_limit: Option<usize>,
    pub max_pages: Option<usize>,
    pub retry_attempts: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub user: Option<UserContext>,
    pub sync: SyncOptions,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, RegError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("regsync.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Err(RegError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| RegError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| RegError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        let defaults = SyncOptions::default();
        let retry = RetryPolicy {
            max_attempts: config.sync.retry_attempts.unwrap_or(defaults.retry.max_attempts),
            base_delay: config
                .sync
                .retry_base_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry.base_delay),
        };
        let sync = SyncOptions {
            insert_batch: config.sync.insert_batch.unwrap_or(defaults.insert_batch),
            delete_batch: config.sync.delete_batch.unwrap_or(defaults.delete_batch),
            insert_delay: config
                .sync
                .insert_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.insert_delay),
            delete_delay: config
                .sync
                .delete_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.delete_delay),
            page_limit: config.sync.page_limit.unwrap_or(defaults.page_limit),
            max_pages: config.sync.max_pages.unwrap_or(defaults.max_pages),
            retry,
        };
        let user = config.user.map(|entry| UserContext {
            username: entry.username,
            company_name: entry.company_name,
            role: entry.role.unwrap_or_default(),
            affiliates: entry.affiliates,
        });
        ResolvedConfig {
            base_url: config.base_url,
            user,
            sync,
        }
    }
}
