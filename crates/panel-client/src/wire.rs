//! Wire-format payloads exchanged with the panel
//!
//! Inbound shapes are deliberately permissive: every protocol variant is
//! served from the same config endpoint, so fields not applicable to the
//! configured variant are simply absent and default.

use serde::{Deserialize, Serialize};

/// Node-config payload from `GET /api/node/config`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeConfigPayload {
    #[serde(default)]
    pub port: u16,
    /// Speed limit in megabits per second; 0 means unlimited.
    #[serde(default)]
    pub speedlimit: f64,
    /// Shadowsocks cipher method.
    #[serde(default)]
    pub method: String,
    /// Shadowsocks pre-shared key.
    #[serde(default)]
    pub server_key: String,
    /// V2ray transport selector: "tcp", "ws" or "grpc".
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub path: String,
    /// Doubles as the gRPC service name.
    #[serde(default)]
    pub sni: String,
    /// "tls" enables TLS for v2ray nodes.
    #[serde(default)]
    pub security: String,
    #[serde(default)]
    pub alter_id: u16,
    /// Trojan transport selector.
    #[serde(default)]
    pub grpc: bool,
}

/// One entry of the roster from `GET /api/node/user`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    pub id: i64,
    #[serde(default)]
    pub passwd: String,
    /// Megabits per second; 0 means unlimited.
    #[serde(default)]
    pub speedlimit: f64,
    /// 0 means unlimited.
    #[serde(default)]
    pub devicelimit: u32,
}

/// Body of `POST /api/node/status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusBody {
    pub cpu: f64,
    pub mem: f64,
    pub disk: f64,
    pub uptime: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OnlineEntry {
    pub uid: i64,
    pub ip: String,
}

/// Envelope of `POST /api/node/user/online`.
#[derive(Debug, Clone, Serialize)]
pub struct OnlineBody {
    pub online: Vec<OnlineEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrafficEntry {
    pub uid: i64,
    pub upload: u64,
    pub download: u64,
}

/// Envelope of `POST /api/node/user/traffic`.
#[derive(Debug, Clone, Serialize)]
pub struct TrafficBody {
    pub traffic: Vec<TrafficEntry>,
}
