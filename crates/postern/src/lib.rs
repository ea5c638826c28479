//! # Postern
//!
//! Contact form gateway. Every submission passes through a fixed chain of
//! gates before anything is mailed:
//!
//! 1. per-client sliding-window rate limit (10 per 15 minutes by default)
//! 2. body decoding (JSON or form-encoded) and field validation
//! 3. bot challenge verification (Cloudflare Turnstile) and content
//!    heuristics, in configurable order
//! 4. administrator notification, then a best-effort localized
//!    acknowledgment to the submitter
//!
//! ## Architecture
//! ```text
//! Client ─► axum router ─► RequestPipeline ─► RateLimiter
//!                                  │         ─► FormValidator
//!                                  │         ─► ChallengeVerifier ─► Turnstile
//!                                  │         ─► ContentFilter
//!                                  └────────► NotificationDispatcher ─► SMTP relay
//! ```

pub mod challenge;
pub mod config;
pub mod filter;
pub mod intake;
pub mod limiter;
pub mod mail;
pub mod pipeline;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use pipeline::{RequestPipeline, Stage};
pub use state::AppState;
