//! Rate limiting middleware.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::security::SecurityService;

/// Admit or reject a request by peer IP and path.
///
/// Install with `axum::middleware::from_fn_with_state` and serve with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(service): State<SecurityService>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let identity = addr.ip().to_string();
    let decision = service.enforce_rate_limit(&identity, request.uri().path());

    match decision {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}
