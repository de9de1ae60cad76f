//! Authentication
//!
//! Bearer token parsing, token verification and the client session provider.

pub mod session;
pub mod verifier;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use sha2::{Digest, Sha256};

pub use session::{CurrentUser, SessionProvider};
pub use verifier::{DatabaseSessionVerifier, RemoteSessionVerifier, SessionVerifier};

/// Tokens are never stored in the clear.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Token from `Authorization: Bearer <token>`, if present and non-empty.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
