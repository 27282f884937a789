//! Client address resolution for rate limiting

use std::net::SocketAddr;

use axum::http::HeaderMap;

/// Key used when no address can be determined
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Resolve the client address used as the per-IP rate-limit key.
///
/// Forwarding headers are client controlled, so they are only read when the
/// server runs behind a proxy that sets them (`trust_forwarded_for`).
/// Otherwise the socket peer address is used.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string())
            .or_else(|| {
                headers
                    .get("x-real-ip")
                    .and_then(|h| h.to_str().ok())
                    .map(|s| s.trim().to_string())
            })
            .filter(|s| !s.is_empty());
        if let Some(ip) = forwarded {
            return ip;
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
