//! Contact form submission endpoint.

use axum::{
    body::Body,
    extract::{ConnectInfo, RawQuery, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use postern_common::ContactError;

use crate::state::AppState;

/// Accept a JSON or form-encoded submission
pub async fn submit(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let identity = client_identity(&headers, peer, state.config.client_ip_header.as_deref());
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    match state
        .pipeline
        .handle(&identity, content_type, query.as_deref(), body)
        .await
    {
        Ok(success_text) => (StatusCode::OK, success_text).into_response(),
        Err(err) => rejection(err),
    }
}

/// Anything but POST on the contact path
pub async fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, "Méthode non autorisée").into_response()
}

fn rejection(err: ContactError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if err.is_server_fault() {
        tracing::error!(status = status.as_u16(), error = %err, "Submission failed on our side");
    }
    (status, err.public_message()).into_response()
}

/// Rate-limit identity: the configured proxy header when present and
/// non-empty, otherwise the peer IP. The port is never part of it.
fn client_identity(headers: &HeaderMap, peer: SocketAddr, trusted_header: Option<&str>) -> String {
    trusted_header
        .and_then(|name| headers.get(name))
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| peer.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "192.0.2.10:51234".parse().unwrap()
    }

    #[test]
    fn test_identity_is_peer_ip_without_port() {
        assert_eq!(client_identity(&HeaderMap::new(), peer(), None), "192.0.2.10");
    }

    #[test]
    fn test_identity_from_trusted_header() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-connecting-ip", HeaderValue::from_static("203.0.113.5"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("198.51.100.1, 10.0.0.1"));

        assert_eq!(
            client_identity(&headers, peer(), Some("CF-Connecting-IP")),
            "203.0.113.5"
        );
        assert_eq!(
            client_identity(&headers, peer(), Some("X-Forwarded-For")),
            "198.51.100.1"
        );
        // Untrusted headers are ignored
        assert_eq!(client_identity(&headers, peer(), None), "192.0.2.10");
    }

    #[test]
    fn test_empty_trusted_header_falls_back_to_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-connecting-ip", HeaderValue::from_static(""));
        assert_eq!(
            client_identity(&headers, peer(), Some("cf-connecting-ip")),
            "192.0.2.10"
        );
    }
}
