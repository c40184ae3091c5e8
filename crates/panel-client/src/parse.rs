//! Translation from panel wire payloads into the canonical model
//!
//! Dispatch is by the *configured* node type, never by inspecting the
//! payload: the caller declares which variant to expect and the payload
//! is assumed to match. Limit overrides are resolved here, once, so the
//! rest of the system only ever sees effective values.

use crate::models::{
    NodeDescriptor, NodeType, ProtocolParams, TransportProtocol, UserRecord,
};
use crate::wire::{NodeConfigPayload, UserPayload};

/// Convert the panel's megabit-per-second unit to bytes per second,
/// truncating: `v * 1_000_000 / 8`.
pub(crate) fn mbps_to_bytes(mbps: f64) -> u64 {
    ((mbps * 1_000_000.0) / 8.0) as u64
}

/// Locally configured limit overrides.
///
/// A positive value wins over whatever the panel supplies; zero or
/// negative defers to the panel. Speed and device limits are resolved
/// independently.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    /// Megabits per second; applied to the node and every user.
    pub speed_limit_mbps: f64,
    pub device_limit: u32,
}

/// Locally configured vless passthrough for v2ray nodes.
///
/// The panel knows nothing about these; they are client-side settings
/// copied verbatim into the descriptor.
#[derive(Debug, Clone, Default)]
pub struct VlessConfig {
    pub enabled: bool,
    pub flow: String,
}

impl Overrides {
    fn effective_speed(&self, panel_mbps: f64) -> u64 {
        if self.speed_limit_mbps > 0.0 {
            mbps_to_bytes(self.speed_limit_mbps)
        } else {
            mbps_to_bytes(panel_mbps)
        }
    }

    fn effective_devices(&self, panel_limit: u32) -> u32 {
        if self.device_limit > 0 {
            self.device_limit
        } else {
            panel_limit
        }
    }
}

/// Build the canonical node descriptor for the configured variant.
pub fn parse_node_config(
    node_type: NodeType,
    node_id: &str,
    overrides: Overrides,
    vless: &VlessConfig,
    payload: &NodeConfigPayload,
) -> NodeDescriptor {
    let speed_limit = overrides.effective_speed(payload.speedlimit);

    match node_type {
        // Shadowsocks carries no alternate transport in this model.
        NodeType::Shadowsocks => NodeDescriptor {
            node_type,
            node_id: node_id.to_string(),
            port: payload.port,
            transport_protocol: TransportProtocol::Tcp,
            enable_tls: false,
            speed_limit,
            params: ProtocolParams::Shadowsocks {
                method: payload.method.clone(),
                server_key: payload.server_key.clone(),
            },
        },
        NodeType::V2ray => {
            let (transport_protocol, host, path, service_name) = match payload.network.as_str() {
                "ws" => (
                    TransportProtocol::Ws,
                    payload.host.clone(),
                    payload.path.clone(),
                    String::new(),
                ),
                "grpc" => (
                    TransportProtocol::Grpc,
                    String::new(),
                    String::new(),
                    payload.sni.clone(),
                ),
                _ => (
                    TransportProtocol::Tcp,
                    String::new(),
                    String::new(),
                    String::new(),
                ),
            };
            NodeDescriptor {
                node_type,
                node_id: node_id.to_string(),
                port: payload.port,
                transport_protocol,
                enable_tls: payload.security == "tls",
                speed_limit,
                params: ProtocolParams::V2ray {
                    host,
                    path,
                    service_name,
                    alter_id: payload.alter_id,
                    enable_vless: vless.enabled,
                    flow: vless.flow.clone(),
                },
            }
        }
        // Trojan is always TLS; the grpc flag switches the transport.
        NodeType::Trojan => NodeDescriptor {
            node_type,
            node_id: node_id.to_string(),
            port: payload.port,
            transport_protocol: if payload.grpc {
                TransportProtocol::Grpc
            } else {
                TransportProtocol::Tcp
            },
            enable_tls: true,
            speed_limit,
            params: ProtocolParams::Trojan {
                host: payload.host.clone(),
                service_name: payload.sni.clone(),
            },
        },
    }
}

/// Translate the roster, preserving order and length: position `i` of the
/// output derives only from position `i` of the input.
pub fn parse_user_roster(overrides: Overrides, payload: &[UserPayload]) -> Vec<UserRecord> {
    payload
        .iter()
        .map(|user| UserRecord {
            uid: user.id,
            passwd: user.passwd.clone(),
            // The panel hands out one secret per user; protocol variants
            // that want a UUID read the same value.
            uuid: user.passwd.clone(),
            speed_limit: overrides.effective_speed(user.speedlimit),
            device_limit: overrides.effective_devices(user.devicelimit),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ss_payload() -> NodeConfigPayload {
        serde_json::from_str(
            r#"{"port": 8443, "method": "aes-256-gcm", "server_key": "k1", "speedlimit": 100}"#,
        )
        .unwrap()
    }

    fn no_vless() -> VlessConfig {
        VlessConfig::default()
    }

    #[test]
    fn test_mbps_conversion_is_exact_for_integral_values() {
        assert_eq!(mbps_to_bytes(100.0), 12_500_000);
        assert_eq!(mbps_to_bytes(1.0), 125_000);
        assert_eq!(mbps_to_bytes(0.0), 0);
    }

    #[test]
    fn test_shadowsocks_descriptor_from_panel_values() {
        let descriptor = parse_node_config(
            NodeType::Shadowsocks,
            "42",
            Overrides::default(),
            &no_vless(),
            &ss_payload(),
        );

        assert_eq!(descriptor.node_id, "42");
        assert_eq!(descriptor.port, 8443);
        assert_eq!(descriptor.transport_protocol, TransportProtocol::Tcp);
        assert!(!descriptor.enable_tls);
        assert_eq!(descriptor.speed_limit, 12_500_000);
        assert_eq!(
            descriptor.params,
            ProtocolParams::Shadowsocks {
                method: "aes-256-gcm".to_string(),
                server_key: "k1".to_string(),
            }
        );
    }

    #[test]
    fn test_positive_override_wins_over_panel_speed() {
        let overrides = Overrides {
            speed_limit_mbps: 10.0,
            device_limit: 0,
        };
        // Override wins regardless of the panel value, zero included.
        for panel_mbps in [0.0, 1.0, 10_000.0] {
            let mut payload = ss_payload();
            payload.speedlimit = panel_mbps;
            let descriptor =
                parse_node_config(NodeType::Shadowsocks, "1", overrides, &no_vless(), &payload);
            assert_eq!(descriptor.speed_limit, 1_250_000);
        }
    }

    #[test]
    fn test_non_positive_override_defers_to_panel() {
        let overrides = Overrides {
            speed_limit_mbps: 0.0,
            device_limit: 0,
        };
        let descriptor =
            parse_node_config(NodeType::Shadowsocks, "1", overrides, &no_vless(), &ss_payload());
        assert_eq!(descriptor.speed_limit, 12_500_000);
    }

    #[test]
    fn test_v2ray_ws_descriptor() {
        let payload: NodeConfigPayload = serde_json::from_str(
            r#"{"port": 443, "network": "ws", "host": "cdn.example.com",
                "path": "/stream", "security": "tls", "alter_id": 4, "speedlimit": 8}"#,
        )
        .unwrap();
        let descriptor =
            parse_node_config(NodeType::V2ray, "n2", Overrides::default(), &no_vless(), &payload);

        assert_eq!(descriptor.transport_protocol, TransportProtocol::Ws);
        assert!(descriptor.enable_tls);
        assert_eq!(descriptor.speed_limit, 1_000_000);
        assert_eq!(
            descriptor.params,
            ProtocolParams::V2ray {
                host: "cdn.example.com".to_string(),
                path: "/stream".to_string(),
                service_name: String::new(),
                alter_id: 4,
                enable_vless: false,
                flow: String::new(),
            }
        );
    }

    #[test]
    fn test_v2ray_grpc_descriptor_takes_service_name_from_sni() {
        let payload: NodeConfigPayload = serde_json::from_str(
            r#"{"port": 443, "network": "grpc", "sni": "svc.example.com", "security": "none"}"#,
        )
        .unwrap();
        let descriptor =
            parse_node_config(NodeType::V2ray, "n3", Overrides::default(), &no_vless(), &payload);

        assert_eq!(descriptor.transport_protocol, TransportProtocol::Grpc);
        assert!(!descriptor.enable_tls);
        assert_eq!(
            descriptor.params,
            ProtocolParams::V2ray {
                host: String::new(),
                path: String::new(),
                service_name: "svc.example.com".to_string(),
                alter_id: 0,
                enable_vless: false,
                flow: String::new(),
            }
        );
    }

    #[test]
    fn test_v2ray_vless_settings_pass_through() {
        let payload: NodeConfigPayload =
            serde_json::from_str(r#"{"port": 443, "network": "ws", "host": "h", "path": "/p"}"#)
                .unwrap();
        let vless = VlessConfig {
            enabled: true,
            flow: "xtls-rprx-vision".to_string(),
        };
        let descriptor =
            parse_node_config(NodeType::V2ray, "n6", Overrides::default(), &vless, &payload);

        match descriptor.params {
            ProtocolParams::V2ray {
                enable_vless, flow, ..
            } => {
                assert!(enable_vless);
                assert_eq!(flow, "xtls-rprx-vision");
            }
            other => panic!("expected V2ray params, got {other:?}"),
        }
    }

    #[test]
    fn test_v2ray_plain_tcp_when_network_unrecognized() {
        let payload: NodeConfigPayload =
            serde_json::from_str(r#"{"port": 443, "network": "tcp"}"#).unwrap();
        let descriptor =
            parse_node_config(NodeType::V2ray, "n4", Overrides::default(), &no_vless(), &payload);
        assert_eq!(descriptor.transport_protocol, TransportProtocol::Tcp);
        assert!(!descriptor.enable_tls);
    }

    #[test]
    fn test_trojan_descriptor_is_always_tls() {
        let payload: NodeConfigPayload = serde_json::from_str(
            r#"{"port": 443, "host": "hk.example.com", "sni": "hk.example.com", "grpc": true}"#,
        )
        .unwrap();
        let descriptor =
            parse_node_config(NodeType::Trojan, "n5", Overrides::default(), &no_vless(), &payload);

        assert!(descriptor.enable_tls);
        assert_eq!(descriptor.transport_protocol, TransportProtocol::Grpc);
        assert_eq!(
            descriptor.params,
            ProtocolParams::Trojan {
                host: "hk.example.com".to_string(),
                service_name: "hk.example.com".to_string(),
            }
        );

        let payload: NodeConfigPayload =
            serde_json::from_str(r#"{"port": 443, "host": "hk.example.com"}"#).unwrap();
        let descriptor =
            parse_node_config(NodeType::Trojan, "n5", Overrides::default(), &no_vless(), &payload);
        assert_eq!(descriptor.transport_protocol, TransportProtocol::Tcp);
    }

    fn roster_payload() -> Vec<UserPayload> {
        serde_json::from_str(
            r#"[{"id": 1, "passwd": "alpha", "speedlimit": 100, "devicelimit": 3},
                {"id": 2, "passwd": "beta", "speedlimit": 0, "devicelimit": 0},
                {"id": 3, "passwd": "gamma", "speedlimit": 8, "devicelimit": 1}]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_roster_preserves_order_and_length() {
        let users = parse_user_roster(Overrides::default(), &roster_payload());
        assert_eq!(users.len(), 3);
        assert_eq!(
            users.iter().map(|u| u.uid).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_roster_credential_maps_to_passwd_and_uuid() {
        let users = parse_user_roster(Overrides::default(), &roster_payload());
        for user in &users {
            assert_eq!(user.passwd, user.uuid);
        }
        assert_eq!(users[0].passwd, "alpha");
    }

    #[test]
    fn test_roster_per_user_values_without_override() {
        let users = parse_user_roster(Overrides::default(), &roster_payload());
        assert_eq!(users[0].speed_limit, 12_500_000);
        assert_eq!(users[0].device_limit, 3);
        assert_eq!(users[1].speed_limit, 0);
        assert_eq!(users[1].device_limit, 0);
        assert_eq!(users[2].speed_limit, 1_000_000);
    }

    #[test]
    fn test_roster_overrides_apply_to_every_user_independently() {
        let overrides = Overrides {
            speed_limit_mbps: 2.0,
            device_limit: 5,
        };
        let users = parse_user_roster(overrides, &roster_payload());
        for user in &users {
            assert_eq!(user.speed_limit, 250_000);
            assert_eq!(user.device_limit, 5);
        }
    }

    #[test]
    fn test_empty_roster_parses_to_empty() {
        let users = parse_user_roster(Overrides::default(), &[]);
        assert!(users.is_empty());
    }
}
