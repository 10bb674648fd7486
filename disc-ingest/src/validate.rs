//! # URL Validation and SSRF Guard
//!
//! Every download URL is validated before any network fetch of the body:
//! scheme must be http/https, the host must resolve, and no resolved
//! address may land in loopback, RFC 1918 private, or link-local space.
//! Resolution itself is the only network activity this module performs.

use crate::error::{IngestError, Result};
use std::net::IpAddr;
use tracing::debug;
use url::Url;

/// Returns `true` if outbound requests to this address must be refused.
///
/// Blocked ranges: 127.0.0.0/8, 10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16,
/// 169.254.0.0/16, and their IPv6 counterparts (loopback, unique-local
/// fc00::/7, link-local fe80::/10, plus v4-mapped forms of the above).
pub fn is_blocked_addr(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => v4.is_loopback() || v4.is_private() || v4.is_link_local(),
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_blocked_addr(IpAddr::V4(mapped));
            }
            let first = v6.segments()[0];
            v6.is_loopback() || (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
        }
    }
}

/// Validate a download URL and resolve its host.
///
/// Fails with [`IngestError::InvalidUrl`] for syntactic problems and
/// unresolvable hosts, and with [`IngestError::Blocked`] when any resolved
/// address is in a blocked range.
pub async fn validate_url(raw: &str) -> Result<Url> {
    if raw.trim().is_empty() {
        return Err(IngestError::InvalidUrl("URL cannot be empty".to_string()));
    }

    let url = Url::parse(raw).map_err(|e| IngestError::InvalidUrl(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(IngestError::InvalidUrl(format!(
                "only HTTP and HTTPS are allowed, got '{}'",
                other
            )))
        }
    }

    let host = url
        .host_str()
        .ok_or_else(|| IngestError::InvalidUrl("no host specified".to_string()))?;
    let port = url.port_or_known_default().unwrap_or(80);

    let addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|_| IngestError::InvalidUrl(format!("cannot resolve host: {}", host)))?;

    let mut resolved_any = false;
    for addr in addrs {
        resolved_any = true;
        if is_blocked_addr(addr.ip()) {
            debug!(%host, addr = %addr.ip(), "blocked download target");
            return Err(IngestError::Blocked);
        }
    }
    if !resolved_any {
        return Err(IngestError::InvalidUrl(format!(
            "cannot resolve host: {}",
            host
        )));
    }

    Ok(url)
}
