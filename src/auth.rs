//! HTTP Basic auth for the dashboard API (spec §6 "Dashboard auth").
//! Grounded on the teacher's `auth::auth_layer` Bearer-token
//! `middleware::from_fn` shape, adapted to Basic credentials via
//! `axum-extra`'s typed `Authorization<Basic>` header since the spec's
//! dashboard config is a single username/password pair, not an opaque
//! token.
//!
//! The layer itself is built inline at `api::router`'s call site
//! (`axum::middleware::from_fn` returns an opaque, unnameable type, so
//! wrapping it in a function that returns `impl Clone` erases the
//! `tower::Layer` impl the router needs). This module only holds the
//! credential check, which is plain and testable on its own.

use axum::http::HeaderMap;
use axum_extra::headers::authorization::Basic;
use axum_extra::headers::{Authorization, HeaderMapExt};

/// True if the request carries an `Authorization: Basic ...` header
/// whose decoded username/password match `user`/`pass`.
pub fn credentials_match(headers: &HeaderMap, user: &str, pass: &str) -> bool {
    match headers.typed_get::<Authorization<Basic>>() {
        Some(auth) => auth.username() == user && auth.password() == pass,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_basic(user: &str, pass: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.typed_insert(Authorization::basic(user, pass));
        headers
    }

    #[test]
    fn matching_credentials_pass() {
        let headers = headers_with_basic("admin", "hunter2");
        assert!(credentials_match(&headers, "admin", "hunter2"));
    }

    #[test]
    fn wrong_password_fails() {
        let headers = headers_with_basic("admin", "wrong");
        assert!(!credentials_match(&headers, "admin", "hunter2"));
    }

    #[test]
    fn missing_header_fails() {
        let headers = HeaderMap::new();
        assert!(!credentials_match(&headers, "admin", "hunter2"));
    }
}
