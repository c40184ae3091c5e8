//! Synchronization client for the proxy-node management panel
//!
//! This crate is the sync layer between a proxy node agent and the
//! central panel. It:
//! - Authenticates every request with a static API key
//! - Pulls node configuration and the authorized user roster
//! - Normalizes the panel's per-protocol wire formats into one canonical
//!   model, resolving local limit overrides against panel values
//! - Pushes back status, online-user and traffic telemetry
//!
//! The caller (the node agent) drives scheduling; every operation here
//! completes inline with no background work.

pub mod client;
pub mod error;
pub mod models;
pub mod parse;
pub mod response;
pub mod rules;
pub mod settings;
pub mod transport;
pub mod wire;

pub use client::{ClientConfig, ClientInfo, PanelClient};
pub use error::Error;
pub use models::{
    DetectResult, DetectRule, NodeDescriptor, NodeHealth, NodeType, OnlineUser, ProtocolParams,
    TransportProtocol, UserRecord, UserTraffic, LOCAL_RULE_ID,
};
pub use parse::{Overrides, VlessConfig};
pub use settings::Settings;
pub use transport::{HttpTransport, RawResponse, Transport, TransportError};
