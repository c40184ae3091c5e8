//! Environment-backed configuration loading
//!
//! Reads `PANEL_*` variables into a [`ClientConfig`], e.g.
//! `PANEL_API_HOST`, `PANEL_API_KEY`, `PANEL_NODE_TYPE`, `PANEL_NODE_ID`,
//! `PANEL_SPEED_LIMIT_MBPS`, `PANEL_DEVICE_LIMIT`, `PANEL_RULE_LIST_PATH`,
//! `PANEL_TIMEOUT_SECS`.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::client::ClientConfig;
use crate::error::Error;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_host: String,
    pub api_key: String,
    pub node_type: String,
    pub node_id: String,
    #[serde(default)]
    pub speed_limit_mbps: f64,
    #[serde(default)]
    pub device_limit: u32,
    #[serde(default)]
    pub enable_vless: bool,
    #[serde(default)]
    pub vless_flow: String,
    #[serde(default)]
    pub rule_list_path: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    5
}

impl Settings {
    /// Load settings from the environment.
    pub fn load() -> Result<Self, Error> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("PANEL"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

impl From<Settings> for ClientConfig {
    fn from(settings: Settings) -> Self {
        ClientConfig {
            api_host: settings.api_host,
            api_key: settings.api_key,
            node_type: settings.node_type,
            node_id: settings.node_id,
            speed_limit_mbps: settings.speed_limit_mbps,
            device_limit: settings.device_limit,
            enable_vless: settings.enable_vless,
            vless_flow: settings.vless_flow,
            rule_list_path: settings.rule_list_path,
            timeout: Some(Duration::from_secs(settings.timeout_secs)),
        }
    }
}
