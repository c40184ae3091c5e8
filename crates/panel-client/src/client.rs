//! Client facade orchestrating classification, parsing and reporting
//!
//! `PanelClient` owns an injected [`Transport`] and the immutable
//! configuration; every operation is a pure function of those plus the
//! panel's response. No state mutates after construction, so one client
//! is safe to share across callers without locking.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::error::Error;
use crate::models::{
    DetectResult, DetectRule, NodeDescriptor, NodeHealth, NodeType, OnlineUser, UserRecord,
    UserTraffic,
};
use crate::parse::{self, Overrides, VlessConfig};
use crate::response::classify;
use crate::rules;
use crate::transport::{HttpTransport, Transport, DEFAULT_TIMEOUT};
use crate::wire::{
    NodeConfigPayload, OnlineBody, OnlineEntry, StatusBody, TrafficBody, TrafficEntry, UserPayload,
};

const NODE_CONFIG_PATH: &str = "/api/node/config";
const USER_LIST_PATH: &str = "/api/node/user";
const NODE_STATUS_PATH: &str = "/api/node/status";
const ONLINE_USERS_PATH: &str = "/api/node/user/online";
const USER_TRAFFIC_PATH: &str = "/api/node/user/traffic";

/// Everything needed to construct a [`PanelClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Panel base address, e.g. "https://panel.example.com".
    pub api_host: String,
    /// Static API key sent as the Authorization header.
    pub api_key: String,
    /// One of "shadowsocks", "v2ray", "trojan" (case-insensitive).
    pub node_type: String,
    pub node_id: String,
    /// Local speed-limit override in mbps; non-positive defers to the panel.
    pub speed_limit_mbps: f64,
    /// Local device-limit override; 0 defers to the panel.
    pub device_limit: u32,
    /// Serve vless on v2ray nodes; passed through to the descriptor.
    pub enable_vless: bool,
    /// Vless flow control name, e.g. "xtls-rprx-vision".
    pub vless_flow: String,
    /// Path of the local rule file; `None` disables auditing.
    pub rule_list_path: Option<PathBuf>,
    /// Per-request timeout; unset or zero falls back to 5 seconds.
    pub timeout: Option<Duration>,
}

/// Description of a configured client, mirroring its construction inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub api_host: String,
    pub node_id: String,
    pub key: String,
    pub node_type: NodeType,
}

/// Synchronization client for the management panel.
#[derive(Debug)]
pub struct PanelClient<T = HttpTransport> {
    transport: T,
    api_host: String,
    api_key: String,
    node_type: NodeType,
    node_id: String,
    overrides: Overrides,
    vless: VlessConfig,
    local_rules: Vec<DetectRule>,
}

impl PanelClient<HttpTransport> {
    /// Build a client over the reqwest transport.
    ///
    /// Fails on an unknown node type, an invalid base address, or a local
    /// rule line that does not compile.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let base_url = Url::parse(&config.api_host).map_err(|source| Error::InvalidAddress {
            address: config.api_host.clone(),
            source,
        })?;
        let timeout = match config.timeout {
            Some(timeout) if !timeout.is_zero() => timeout,
            _ => DEFAULT_TIMEOUT,
        };
        let transport = HttpTransport::new(base_url, &config.api_key, timeout)
            .map_err(|source| Error::TransportBuild { source })?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> PanelClient<T> {
    /// Build a client over an externally supplied transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, Error> {
        let node_type: NodeType = config.node_type.parse()?;
        let local_rules = rules::load_local_rules(config.rule_list_path.as_deref())?;

        info!(
            node_type = %node_type,
            node_id = %config.node_id,
            local_rules = local_rules.len(),
            "panel client configured"
        );

        Ok(Self {
            transport,
            api_host: config.api_host,
            api_key: config.api_key,
            node_type,
            node_id: config.node_id,
            overrides: Overrides {
                speed_limit_mbps: config.speed_limit_mbps,
                device_limit: config.device_limit,
            },
            vless: VlessConfig {
                enabled: config.enable_vless,
                flow: config.vless_flow,
            },
            local_rules,
        })
    }

    /// Describe the client's construction inputs.
    pub fn describe(&self) -> ClientInfo {
        ClientInfo {
            api_host: self.api_host.clone(),
            node_id: self.node_id.clone(),
            key: self.api_key.clone(),
            node_type: self.node_type,
        }
    }

    async fn get_json<P: DeserializeOwned>(&self, path: &str) -> Result<P, Error> {
        let body = classify(path, self.transport.get(path).await)?;
        serde_json::from_slice(&body).map_err(Error::deserialize::<P>)
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<(), Error> {
        let bytes = serde_json::to_vec(body).map_err(Error::serialize::<B>)?;
        classify(path, self.transport.post_json(path, bytes).await)?;
        Ok(())
    }

    /// Fetch and normalize the node configuration for one config epoch.
    pub async fn fetch_node_config(&self) -> Result<NodeDescriptor, Error> {
        let path = format!(
            "{NODE_CONFIG_PATH}?protocol={}&node_id={}",
            self.node_type, self.node_id
        );
        let payload: NodeConfigPayload = self.get_json(&path).await?;
        let descriptor = parse::parse_node_config(
            self.node_type,
            &self.node_id,
            self.overrides,
            &self.vless,
            &payload,
        );

        debug!(
            port = descriptor.port,
            transport = %descriptor.transport_protocol,
            speed_limit = descriptor.speed_limit,
            "node config fetched"
        );
        Ok(descriptor)
    }

    /// Fetch the authorized user roster, in panel order.
    ///
    /// The caller replaces its previous roster atomically with the result.
    pub async fn fetch_user_roster(&self) -> Result<Vec<UserRecord>, Error> {
        let payload: Vec<UserPayload> = self.get_json(USER_LIST_PATH).await?;
        let users = parse::parse_user_roster(self.overrides, &payload);

        debug!(node_id = %self.node_id, count = users.len(), "user roster fetched");
        Ok(users)
    }

    /// Report node health scalars.
    pub async fn report_node_status(&self, health: &NodeHealth) -> Result<(), Error> {
        let body = StatusBody {
            cpu: health.cpu,
            mem: health.mem,
            disk: health.disk,
            uptime: health.uptime,
        };
        self.post_json(NODE_STATUS_PATH, &body).await
    }

    /// Report the currently online users, mirrored 1:1 from the input.
    pub async fn report_online_users(&self, online: &[OnlineUser]) -> Result<(), Error> {
        let body = OnlineBody {
            online: online
                .iter()
                .map(|user| OnlineEntry {
                    uid: user.uid,
                    ip: user.ip.clone(),
                })
                .collect(),
        };
        self.post_json(ONLINE_USERS_PATH, &body).await
    }

    /// Report per-user traffic counters. The whole batch is accepted or
    /// the whole call fails; there is no partial acknowledgment.
    pub async fn report_user_traffic(&self, traffic: &[UserTraffic]) -> Result<(), Error> {
        let body = TrafficBody {
            traffic: traffic
                .iter()
                .map(|entry| TrafficEntry {
                    uid: entry.uid,
                    upload: entry.upload,
                    download: entry.download,
                })
                .collect(),
        };
        self.post_json(USER_TRAFFIC_PATH, &body).await
    }

    /// Return the audit rules.
    ///
    /// Currently serves the once-loaded local rules and does not contact
    /// the panel; remote rule fetching stays disabled.
    pub async fn fetch_audit_rules(&self) -> Result<Vec<DetectRule>, Error> {
        Ok(self.local_rules.clone())
    }

    /// Accept an illegal-behavior batch without transmitting it; remote
    /// reporting stays disabled.
    pub async fn report_illegal_behavior(&self, results: &[DetectResult]) -> Result<(), Error> {
        debug!(
            count = results.len(),
            "illegal-behavior reporting is disabled, dropping batch"
        );
        Ok(())
    }
}
