//! Sliding-window rate limit on the credential routes (sign-up, sign-in).
//!
//! Clients are keyed by the TCP peer address. `X-Forwarded-For` only counts
//! when the peer is a configured trusted proxy; the client is then the
//! nearest hop that is not itself a trusted proxy.

use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

/// Resolve the client address for rate limiting.
fn client_ip(peer: Option<IpAddr>, headers: &HeaderMap, trusted: &[IpAddr]) -> Option<IpAddr> {
    let peer = peer?;
    if !trusted.contains(&peer) {
        return Some(peer);
    }

    let forwarded: Vec<IpAddr> = headers
        .get_all("X-Forwarded-For")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|hop| hop.trim().parse().ok())
        .collect();

    Some(
        forwarded
            .into_iter()
            .rev()
            .find(|hop| !trusted.contains(hop))
            .unwrap_or(peer),
    )
}

fn client_key(ip: Option<IpAddr>) -> String {
    match ip {
        Some(ip) => format!("ip:{ip}"),
        None => "peer:unknown".to_string(),
    }
}

/// Count the request against its client window before passing it on.
pub async fn limit(req: Request<axum::body::Body>, next: Next) -> Response {
    let Some(ctx) = req.extensions().get::<ApiContext>().cloned() else {
        return ApiError::Internal("missing API context".into()).into_response();
    };
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let key = client_key(client_ip(peer, req.headers(), &ctx.trusted_proxies));

    // Guard is !Send; the verdict is taken before awaiting the handler.
    let verdict = match ctx.rate_limiter.lock() {
        Ok(mut limiter) => limiter.check(&key),
        Err(_) => return ApiError::Internal("rate limiter lock".into()).into_response(),
    };

    if let Err(retry_after) = verdict {
        tracing::warn!(client = %key, retry_after, "Rate limit exceeded");
        return ApiError::RateLimited { retry_after }.into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn untrusted_peer_ignores_forwarded_header() {
        let headers = forwarded("198.51.100.4");
        assert_eq!(
            client_ip(Some(ip("203.0.113.9")), &headers, &[]),
            Some(ip("203.0.113.9"))
        );
        assert_eq!(
            client_ip(Some(ip("203.0.113.9")), &headers, &[ip("10.0.0.1")]),
            Some(ip("203.0.113.9"))
        );
    }

    #[test]
    fn trusted_proxy_yields_nearest_untrusted_hop() {
        let trusted = [ip("10.0.0.1"), ip("10.0.0.2")];
        let headers = forwarded("1.2.3.4, 198.51.100.4, 10.0.0.2");
        assert_eq!(
            client_ip(Some(ip("10.0.0.1")), &headers, &trusted),
            Some(ip("198.51.100.4"))
        );
    }

    #[test]
    fn trusted_proxy_without_usable_header_keys_on_proxy() {
        let trusted = [ip("10.0.0.1")];
        assert_eq!(
            client_ip(Some(ip("10.0.0.1")), &forwarded("garbage"), &trusted),
            Some(ip("10.0.0.1"))
        );
    }

    #[test]
    fn missing_peer_shares_bucket() {
        let headers = forwarded("198.51.100.4");
        assert_eq!(client_key(client_ip(None, &headers, &[])), "peer:unknown");
        assert_eq!(client_key(Some(ip("::1"))), "ip:::1");
    }
}
