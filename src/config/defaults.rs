//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use std::net::SocketAddr;

/// Placeholder documentation username used when none is configured.
pub const PLACEHOLDER_ADMIN_USER: &str = "admin";

/// Placeholder documentation password used when none is configured.
pub const PLACEHOLDER_ADMIN_PASS: &str = "changeme123";

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

// =============================================================================
// Database Defaults
// =============================================================================

pub fn default_max_connections() -> u32 {
    5
}

// =============================================================================
// Documentation Defaults
// =============================================================================

pub fn default_admin_user() -> String {
    PLACEHOLDER_ADMIN_USER.to_string()
}

pub fn default_admin_pass() -> String {
    PLACEHOLDER_ADMIN_PASS.to_string()
}

pub fn default_docs_title() -> String {
    "Lead Capture API".to_string()
}

/// Returns `true` when the documentation credentials are the shipped
/// placeholders or otherwise too weak for a public deployment.
pub fn is_default_credential(username: &str, password: &str) -> bool {
    password == PLACEHOLDER_ADMIN_PASS
        || password.contains("changeme")
        || password.len() < 12
        || password.eq_ignore_ascii_case(username)
}
