//! Header-signature authenticator backed by the `[users]` table

use async_trait::async_trait;
use axum::http::HeaderMap;
use mfan_common::api::auth::{
    now_millis, validate_signature, validate_timestamp, ApiAuthError, SIGNATURE_HEADER,
    TIMESTAMP_HEADER, USER_HEADER,
};
use mfan_common::config::{AuthConfig, UserConfig};
use mfan_common::models::Principal;
use std::collections::BTreeMap;

use crate::collaborators::Authenticator;

/// Authenticates `x-mfan-user` / `x-mfan-timestamp` / `x-mfan-signature`
///
/// With an empty shared secret only the user header is checked.
pub struct SignedHeaderAuthenticator {
    auth: AuthConfig,
    users: BTreeMap<String, UserConfig>,
    now: fn() -> i64,
}

impl SignedHeaderAuthenticator {
    pub fn new(auth: AuthConfig, users: BTreeMap<String, UserConfig>) -> Self {
        Self {
            auth,
            users,
            now: now_millis,
        }
    }

    /// Replace the wall clock (Unix ms).
    pub fn with_clock(mut self, now: fn() -> i64) -> Self {
        self.now = now;
        self
    }

    fn verify_signature(&self, headers: &HeaderMap, username: &str) -> Result<(), ApiAuthError> {
        let timestamp = header(headers, TIMESTAMP_HEADER)?
            .parse::<i64>()
            .map_err(|e| ApiAuthError::MalformedHeader {
                header: TIMESTAMP_HEADER,
                reason: e.to_string(),
            })?;
        let signature = header(headers, SIGNATURE_HEADER)?;

        validate_timestamp(timestamp, (self.now)(), self.auth.max_clock_skew_ms)?;
        validate_signature(signature, username, timestamp, &self.auth.shared_secret)
    }
}

#[async_trait]
impl Authenticator for SignedHeaderAuthenticator {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, ApiAuthError> {
        let username = header(headers, USER_HEADER)?;

        if self.auth.signatures_enabled() {
            self.verify_signature(headers, username)?;
        }

        let user = self
            .users
            .get(username)
            .ok_or_else(|| ApiAuthError::UnknownUser(username.to_string()))?;

        Ok(Principal::new(username, user.role).with_groups(user.groups.iter().cloned()))
    }
}

/// Non-empty, trimmed, valid-UTF-8 header value
fn header<'h>(headers: &'h HeaderMap, name: &'static str) -> Result<&'h str, ApiAuthError> {
    let value = headers.get(name).ok_or(ApiAuthError::MissingHeader(name))?;
    let value = value.to_str().map_err(|e| ApiAuthError::MalformedHeader {
        header: name,
        reason: e.to_string(),
    })?;
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiAuthError::MissingHeader(name));
    }
    Ok(value)
}
