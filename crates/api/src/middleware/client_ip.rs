//! Client IP resolution behind Cloudflare and Render's proxy.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

/// First trustworthy client address found in proxy headers:
/// `CF-Connecting-IP`, then the first `X-Forwarded-For` hop, then
/// `X-Real-IP`.
#[must_use]
pub fn ip_from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    header("cf-connecting-ip")
        .and_then(|s| s.trim().parse().ok())
        .or_else(|| {
            header("x-forwarded-for")
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse().ok())
        })
        .or_else(|| header("x-real-ip").and_then(|s| s.trim().parse().ok()))
}

/// The caller's IP address, as recorded in audit and contact rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub Option<IpAddr>);

impl ClientIp {
    #[must_use]
    pub fn to_db(self) -> Option<String> {
        self.0.map(|ip| ip.to_string())
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = ip_from_headers(&parts.headers).or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        });
        Ok(Self(ip))
    }
}
