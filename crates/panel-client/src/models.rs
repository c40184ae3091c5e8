//! Canonical entities produced and consumed by the panel sync client
//!
//! The panel speaks several incompatible wire formats depending on the
//! proxy protocol variant; everything in this module is the normalized
//! form the node agent works with.

use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Proxy protocol variant served by this node.
///
/// Closed set: anything else the configuration names is rejected at
/// client construction, so downstream dispatch is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Shadowsocks,
    V2ray,
    Trojan,
}

impl NodeType {
    /// Lowercase wire name, used as the `protocol` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Shadowsocks => "shadowsocks",
            NodeType::V2ray => "v2ray",
            NodeType::Trojan => "trojan",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shadowsocks" => Ok(NodeType::Shadowsocks),
            "v2ray" => Ok(NodeType::V2ray),
            "trojan" => Ok(NodeType::Trojan),
            other => Err(Error::UnsupportedNodeType(other.to_string())),
        }
    }
}

/// Negotiated transport carrying the proxy protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportProtocol {
    Tcp,
    Ws,
    Grpc,
}

impl TransportProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportProtocol::Tcp => "tcp",
            TransportProtocol::Ws => "ws",
            TransportProtocol::Grpc => "grpc",
        }
    }
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol-specific portion of a node configuration.
///
/// Each variant carries only the fields that apply to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolParams {
    Shadowsocks {
        /// Cipher method, e.g. "aes-256-gcm".
        method: String,
        /// Pre-shared server key.
        server_key: String,
    },
    V2ray {
        /// Websocket host header; empty unless the transport is ws.
        host: String,
        /// Websocket path; empty unless the transport is ws.
        path: String,
        /// gRPC service name; empty unless the transport is grpc.
        service_name: String,
        alter_id: u16,
        /// Locally configured vless switch, passed through untouched.
        enable_vless: bool,
        /// Vless flow control name; empty when vless is off.
        flow: String,
    },
    Trojan {
        host: String,
        service_name: String,
    },
}

/// Canonical node configuration for one config epoch.
///
/// Immutable after construction; the effective speed limit is either the
/// local override or the panel value, never a blend of the two.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDescriptor {
    pub node_type: NodeType,
    pub node_id: String,
    pub port: u16,
    pub transport_protocol: TransportProtocol,
    pub enable_tls: bool,
    /// Effective speed limit in bytes per second; 0 means unlimited.
    pub speed_limit: u64,
    pub params: ProtocolParams,
}

/// One authorized client of the node.
///
/// The panel hands out a single credential; it is carried in both
/// `passwd` and `uuid` because protocol variants historically shared
/// one secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub uid: i64,
    pub passwd: String,
    pub uuid: String,
    /// Effective speed limit in bytes per second; 0 means unlimited.
    pub speed_limit: u64,
    /// Effective max concurrent devices; 0 means unlimited.
    pub device_limit: u32,
}

/// Rule identifier assigned to rules loaded from the local file, which
/// carry no panel-assigned id.
pub const LOCAL_RULE_ID: i64 = -1;

/// A traffic-audit pattern, loaded once at startup and read-only after.
#[derive(Debug, Clone)]
pub struct DetectRule {
    pub id: i64,
    pub pattern: Regex,
}

/// An audit hit the node agent wants reported to the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectResult {
    pub uid: i64,
    pub rule_id: i64,
}

/// Node health scalars reported to the panel as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeHealth {
    pub cpu: f64,
    pub mem: f64,
    pub disk: f64,
    pub uptime: u64,
}

/// One online user with the address the connection originated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlineUser {
    pub uid: i64,
    pub ip: String,
}

/// Per-user traffic counters; the caller computes deltas before calling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTraffic {
    pub uid: i64,
    pub upload: u64,
    pub download: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_parse_case_insensitive() {
        assert_eq!("Shadowsocks".parse::<NodeType>().unwrap(), NodeType::Shadowsocks);
        assert_eq!("V2RAY".parse::<NodeType>().unwrap(), NodeType::V2ray);
        assert_eq!("trojan".parse::<NodeType>().unwrap(), NodeType::Trojan);
    }

    #[test]
    fn test_node_type_parse_rejects_unknown() {
        let err = "wireguard".parse::<NodeType>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedNodeType(ref t) if t == "wireguard"));
    }

    #[test]
    fn test_node_type_wire_name() {
        assert_eq!(NodeType::Shadowsocks.to_string(), "shadowsocks");
        assert_eq!(NodeType::V2ray.to_string(), "v2ray");
        assert_eq!(NodeType::Trojan.to_string(), "trojan");
    }

    #[test]
    fn test_transport_protocol_wire_name() {
        assert_eq!(TransportProtocol::Tcp.as_str(), "tcp");
        assert_eq!(TransportProtocol::Ws.as_str(), "ws");
        assert_eq!(TransportProtocol::Grpc.as_str(), "grpc");
    }
}
