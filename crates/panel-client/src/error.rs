//! Error taxonomy for panel interactions
//!
//! Every failure this crate produces is a structured value; nothing here
//! terminates the process. The one deliberately fatal condition is
//! [`Error::RulePattern`]: a local rule line that does not compile aborts
//! client construction, while an unreadable rule file merely degrades to
//! an empty rule set.

use thiserror::Error;

use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum Error {
    /// The request never produced an HTTP response (DNS, timeout,
    /// connection refused). The transport has already exhausted its
    /// bounded retries by the time this surfaces.
    #[error("request {path} failed: {source}")]
    Connectivity {
        path: String,
        #[source]
        source: TransportError,
    },

    /// 400: malformed request, indicates a client bug. Non-retryable.
    #[error("request {path} failed with bad request: {body}")]
    BadRequest { path: String, body: String },

    /// 401: the panel rejected the auth key. Non-retryable.
    #[error("request {path} failed with unauthorized: {body}")]
    Unauthorized { path: String, body: String },

    /// 403: the panel refused the operation. Non-retryable.
    #[error("request {path} failed with forbidden: {body}")]
    Forbidden { path: String, body: String },

    /// Any other non-200 status; the caller decides retry policy.
    #[error("request {path} failed with status code {status}: {body}")]
    Upstream {
        path: String,
        status: u16,
        body: String,
    },

    /// The payload did not match the expected shape. Non-retryable.
    #[error("unmarshal {what} failed: {source}")]
    Deserialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// An outbound telemetry batch could not be serialized.
    #[error("marshal {what} failed: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The configured node type is not one of shadowsocks/v2ray/trojan.
    /// Fatal at construction.
    #[error("unsupported node type: {0}")]
    UnsupportedNodeType(String),

    /// A local rule line failed to compile. Fatal at construction.
    #[error("invalid rule pattern {pattern:?}: {source}")]
    RulePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The panel base address is not a valid URL.
    #[error("invalid panel address {address}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: url::ParseError,
    },

    /// The HTTP transport could not be constructed.
    #[error("failed to build panel transport: {source}")]
    TransportBuild {
        #[source]
        source: TransportError,
    },

    /// Environment-backed settings could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// True for failures the caller may reasonably retry later; the
    /// classified 4xx and parse failures are configuration or code bugs
    /// and retrying them will not help.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Connectivity { .. } | Error::Upstream { .. })
    }

    pub(crate) fn deserialize<T>(source: serde_json::Error) -> Self {
        Error::Deserialize {
            what: std::any::type_name::<T>(),
            source,
        }
    }

    pub(crate) fn serialize<T>(source: serde_json::Error) -> Self {
        Error::Serialize {
            what: std::any::type_name::<T>(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let err = Error::Upstream {
            path: "/api/node/config".to_string(),
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert!(err.is_retryable());

        let err = Error::Unauthorized {
            path: "/api/node/user".to_string(),
            body: "invalid key".to_string(),
        };
        assert!(!err.is_retryable());

        assert!(!Error::UnsupportedNodeType("wireguard".to_string()).is_retryable());
    }

    #[test]
    fn test_error_message_carries_path_and_body() {
        let err = Error::Upstream {
            path: "/api/node/status".to_string(),
            status: 500,
            body: "boom".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/api/node/status"));
        assert!(msg.contains("500"));
        assert!(msg.contains("boom"));
    }
}
