//! Single normalization point for panel responses
//!
//! Every request the facade makes funnels its raw outcome through
//! [`classify`], so all panel error reporting carries the same shape:
//! a transport failure references the target path, a 200 passes its body
//! through untouched, and the handful of meaningful status codes map to
//! their own error kinds.

use crate::error::Error;
use crate::transport::{RawResponse, TransportError};

/// Turn a transport outcome into payload bytes or a classified failure.
pub fn classify(
    path: &str,
    outcome: Result<RawResponse, TransportError>,
) -> Result<Vec<u8>, Error> {
    let response = outcome.map_err(|source| Error::Connectivity {
        path: path.to_string(),
        source,
    })?;

    if response.status == 200 {
        return Ok(response.body);
    }

    // Non-200 bodies are diagnostic text from the panel.
    let body = String::from_utf8_lossy(&response.body).into_owned();
    let path = path.to_string();
    Err(match response.status {
        400 => Error::BadRequest { path, body },
        401 => Error::Unauthorized { path, body },
        403 => Error::Forbidden { path, body },
        status => Error::Upstream { path, status, body },
    })
}
