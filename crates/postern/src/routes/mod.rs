//! HTTP route handlers for Postern.

use axum::{
    Router,
    http::{HeaderName, HeaderValue},
    routing::{get, post},
};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use postern_common::constants::headers;

use crate::state::AppState;

mod contact;
mod health;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let contact_path = state.config.contact_path.clone();

    Router::new()
        // Health & Status
        .route("/health", get(health::health_check))

        // Contact submissions; other methods get 405
        .route(
            &contact_path,
            post(contact::submit).fallback(contact::method_not_allowed),
        )

        // Security headers on every response, including errors
        .layer(security_header(headers::X_CONTENT_TYPE_OPTIONS, headers::NOSNIFF))
        .layer(security_header(headers::X_FRAME_OPTIONS, headers::DENY))
        .layer(security_header(headers::X_XSS_PROTECTION, headers::XSS_BLOCK))
        .layer(TraceLayer::new_for_http())

        // Add shared state
        .with_state(state)
}

fn security_header(name: &'static str, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static(name),
        HeaderValue::from_static(value),
    )
}
