//! The submitting client's address.

use std::{convert::Infallible, net::SocketAddr};

use axum::{
  extract::{ConnectInfo, FromRequestParts},
  http::request::Parts,
};

/// Client address for a request: the first hop of `X-Forwarded-For` when a
/// proxy set one, else the peer address of the socket. `None` when neither
/// is available (e.g. in-process requests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddress(pub Option<String>);

impl ClientAddress {
  pub fn from_parts(parts: &Parts) -> Self {
    let forwarded = parts
      .headers
      .get("x-forwarded-for")
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.split(',').next())
      .map(str::trim)
      .filter(|hop| !hop.is_empty())
      .map(str::to_owned);

    let peer = || {
      parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
    };

    ClientAddress(forwarded.or_else(peer))
  }
}

impl<S: Send + Sync> FromRequestParts<S> for ClientAddress {
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    Ok(ClientAddress::from_parts(parts))
  }
}
