//! Client address extraction.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts, connect_info::MockConnectInfo},
    http::{Extensions, HeaderMap, request::Parts},
};

use crate::state::AppState;

/// Header set by reverse proxies with the original client chain.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Address recorded when the socket peer is unknown.
pub const UNKNOWN_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// The requesting client's address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddress(pub IpAddr);

/// Resolve the client address for a request.
///
/// With `trust_proxy`, the first parseable `X-Forwarded-For` hop wins.
/// Otherwise (or without the header) the socket peer is used, falling back
/// to a `MockConnectInfo` layer when the router is served without one.
pub fn client_address(headers: &HeaderMap, extensions: &Extensions, trust_proxy: bool) -> IpAddr {
    if trust_proxy
        && let Some(ip) = forwarded_for(headers)
    {
        return ip;
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .or_else(|| {
            extensions
                .get::<MockConnectInfo<SocketAddr>>()
                .map(|MockConnectInfo(addr)| addr.ip())
        })
        .unwrap_or(UNKNOWN_ADDRESS)
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get(FORWARDED_FOR_HEADER)?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .and_then(|hop| hop.trim().parse().ok())
}

impl FromRequestParts<AppState> for ClientAddress {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(ClientAddress(client_address(
            &parts.headers,
            &parts.extensions,
            state.config.trust_proxy,
        )))
    }
}
