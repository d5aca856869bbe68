//! Exit address check
//!
//! Asks an IP echo service which public address requests leave from, using
//! the same client the crawl uses. Through Tor this is the exit relay.

use crate::crawler::fetcher::{Fetch, FetchResult};
use crate::crawler::identity::Identity;
use serde::Deserialize;
use std::net::IpAddr;
use thiserror::Error;

/// Errors from the exit address check
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("{endpoint} cannot be reached: {error}")]
    Unreachable { endpoint: String, error: String },

    #[error("{endpoint} answered HTTP {status_code}")]
    Status { endpoint: String, status_code: u16 },

    #[error("{endpoint} returned no usable IP address: {error}")]
    BadResponse { endpoint: String, error: String },
}

impl CheckError {
    /// True when no response came back at all, e.g. the proxy is down
    pub fn is_unreachable(&self) -> bool {
        matches!(self, CheckError::Unreachable { .. })
    }
}

#[derive(Deserialize)]
struct IpEcho {
    ip: IpAddr,
}

/// Fetches `endpoint` and reads the caller's address from it
///
/// Accepts a JSON body with an `ip` field (`{"ip":"203.0.113.7"}`) or a
/// bare address as plain text.
///
/// # Arguments
///
/// * `fetcher` - The fetcher the crawl will use
/// * `endpoint` - IP echo address
///
/// # Returns
///
/// * `Ok(IpAddr)` - The public address seen by the echo service
/// * `Err(CheckError)` - The service could not be reached or gave no address
pub async fn exit_ip<F: Fetch>(fetcher: &F, endpoint: &str) -> Result<IpAddr, CheckError> {
    let body = match fetcher.fetch(endpoint, &Identity::unrotated()).await {
        FetchResult::Success { body, .. } => body,
        FetchResult::HttpError { status_code } => {
            return Err(CheckError::Status {
                endpoint: endpoint.to_string(),
                status_code,
            })
        }
        FetchResult::InvalidUrl { error } | FetchResult::NetworkError { error } => {
            return Err(CheckError::Unreachable {
                endpoint: endpoint.to_string(),
                error,
            })
        }
        FetchResult::Truncated { error } => {
            return Err(CheckError::BadResponse {
                endpoint: endpoint.to_string(),
                error,
            })
        }
    };

    if let Ok(echo) = serde_json::from_slice::<IpEcho>(&body) {
        return Ok(echo.ip);
    }

    let text = String::from_utf8_lossy(&body);
    text.trim()
        .parse::<IpAddr>()
        .map_err(|e| CheckError::BadResponse {
            endpoint: endpoint.to_string(),
            error: e.to_string(),
        })
}
