// src/config.rs

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::dedupe::FilterPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct CrtShConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String { "https://crt.sh".to_string() }
fn default_fetch_timeout() -> u64 { 60 }
fn default_user_agent() -> String {
    concat!("crt-expiry/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for CrtShConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_fetch_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Which records the deduplicator discards before selection
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterPolicyKind {
    #[default]
    GraceWindow,
    DropExpired,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    #[serde(default)]
    pub policy: FilterPolicyKind,
    #[serde(default = "default_grace_days")]
    pub grace_days: u32,
}

fn default_grace_days() -> u32 { 30 }

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            policy: FilterPolicyKind::default(),
            grace_days: default_grace_days(),
        }
    }
}

impl FilterConfig {
    pub fn policy(&self) -> FilterPolicy {
        match self.policy {
            FilterPolicyKind::GraceWindow => FilterPolicy::GraceWindow {
                days: self.grace_days,
            },
            FilterPolicyKind::DropExpired => FilterPolicy::DropExpired,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct VerifyConfig {
    #[serde(default = "default_verify_enabled")]
    pub enabled: bool,
    #[serde(default = "default_verify_port")]
    pub port: u16,
    #[serde(default = "default_verify_timeout")]
    pub timeout_secs: u64,
}

fn default_verify_enabled() -> bool { true }
fn default_verify_port() -> u16 { 443 }
fn default_verify_timeout() -> u64 { 10 }

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            enabled: default_verify_enabled(),
            port: default_verify_port(),
            timeout_secs: default_verify_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub crtsh: CrtShConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub verify: VerifyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&contents)?;
        Ok(cfg)
    }
}
