//! Shared constants for Postern components.

/// Default HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

/// Default path of the contact endpoint
pub const DEFAULT_CONTACT_PATH: &str = "/api/contact";

/// Maximum accepted request body in bytes
pub const DEFAULT_MAX_BODY_BYTES: usize = 200_000;

/// Rate limit window (15 minutes)
pub const RATE_WINDOW_SECS: u64 = 900;

/// Admissions allowed per identity within the window
pub const RATE_MAX_REQUESTS: usize = 10;

/// Cloudflare Turnstile verification endpoint
pub const TURNSTILE_VERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// Default SMTP relay (STARTTLS on 587)
pub const DEFAULT_SMTP_RELAY: &str = "ssl0.ovh.net";
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Structural validation bounds (in characters)
pub mod limits {
    pub const NAME_MIN: usize = 2;
    pub const NAME_MAX: usize = 80;
    pub const PHONE_MAX: usize = 40;
    pub const MESSAGE_MIN: usize = 3;
    /// Stricter deployments use this lower bound instead
    pub const MESSAGE_MIN_STRICT: usize = 10;
    pub const MESSAGE_MAX: usize = 5000;
}

/// Submitted field names (JSON keys and form-encoded names)
pub mod fields {
    pub const NAME: &str = "name";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "tel";
    pub const LANGUAGE: &str = "language";
    pub const MESSAGE: &str = "message";
    pub const CHALLENGE_TOKEN: &str = "cf-turnstile-response";
}

/// Media types accepted on the contact endpoint
pub mod media {
    pub const JSON: &str = "application/json";
    pub const FORM: &str = "application/x-www-form-urlencoded";
}

/// HTTP header names and values
pub mod headers {
    pub const X_CONTENT_TYPE_OPTIONS: &str = "x-content-type-options";
    pub const X_FRAME_OPTIONS: &str = "x-frame-options";
    pub const X_XSS_PROTECTION: &str = "x-xss-protection";

    pub const NOSNIFF: &str = "nosniff";
    pub const DENY: &str = "DENY";
    pub const XSS_BLOCK: &str = "1; mode=block";
}
