//! API endpoint URL builders

use intake_common::Token;

fn segment(token: &Token) -> String {
    urlencoding::encode(token.as_str()).into_owned()
}

fn trimmed(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// Build health check URL
pub fn health_url(base_url: &str) -> String {
    format!("{}/health", trimmed(base_url))
}

/// Build invitation issue URL
pub fn invitations_url(base_url: &str) -> String {
    format!("{}/invitations", trimmed(base_url))
}

/// Build overview listing URL
pub fn records_url(base_url: &str) -> String {
    format!("{}/records", trimmed(base_url))
}

/// Build single record URL
pub fn record_url(base_url: &str, token: &Token) -> String {
    format!("{}/records/{}", trimmed(base_url), segment(token))
}

/// Build audit log URL
pub fn audit_url(base_url: &str, token: &Token) -> String {
    format!("{}/records/{}/audit", trimmed(base_url), segment(token))
}
