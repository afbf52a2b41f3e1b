//! Request signature primitives
//!
//! A request is signed with three headers:
//! - `x-mfan-user`: username
//! - `x-mfan-timestamp`: Unix epoch milliseconds
//! - `x-mfan-signature`: hex SHA-256 of `"{user}:{timestamp}:{secret}"`
//!
//! An empty shared secret disables signature and timestamp checks.
//!
//! # Pure Functions
//!
//! No HTTP framework dependencies here; the service wraps these in its own
//! authenticator.

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Header carrying the username
pub const USER_HEADER: &str = "x-mfan-user";
/// Header carrying the request timestamp (Unix ms)
pub const TIMESTAMP_HEADER: &str = "x-mfan-timestamp";
/// Header carrying the request signature
pub const SIGNATURE_HEADER: &str = "x-mfan-signature";

/// Authentication error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiAuthError {
    /// Timestamp outside acceptable window
    #[error("Invalid timestamp: {reason}")]
    InvalidTimestamp {
        timestamp: i64,
        now: i64,
        reason: String,
    },

    /// Signature does not match calculated value
    #[error("Invalid signature")]
    InvalidSignature,

    /// Required header missing from request
    #[error("Missing header: {0}")]
    MissingHeader(&'static str),

    /// Header present but unparseable
    #[error("Malformed header {header}: {reason}")]
    MalformedHeader { header: &'static str, reason: String },

    /// User not known to the server
    #[error("Unknown user: {0}")]
    UnknownUser(String),
}

/// Current Unix time in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ========================================
// Timestamp Validation
// ========================================

/// Validate that `timestamp` lies within `max_skew_ms` of `now`, in either
/// direction.
///
/// # Examples
///
/// ```
/// use mfan_common::api::auth::validate_timestamp;
///
/// let now = 1_730_000_000_000i64;
/// assert!(validate_timestamp(now - 500, now, 30_000).is_ok());
/// assert!(validate_timestamp(now - 30_001, now, 30_000).is_err());
/// assert!(validate_timestamp(now + 30_001, now, 30_000).is_err());
/// ```
pub fn validate_timestamp(timestamp: i64, now: i64, max_skew_ms: u64) -> Result<(), ApiAuthError> {
    let diff = now.saturating_sub(timestamp);
    let max = max_skew_ms.min(i64::MAX as u64) as i64;

    if diff > max {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("Timestamp {}ms too old (max {}ms)", diff, max),
        });
    }

    if diff < -max {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("Timestamp {}ms in future (max {}ms)", diff.abs(), max),
        });
    }

    Ok(())
}

// ========================================
// Signature Calculation and Validation
// ========================================

/// Calculate the request signature as 64 lowercase hex characters.
///
/// # Examples
///
/// ```
/// use mfan_common::api::auth::calculate_signature;
///
/// let sig = calculate_signature("alice", 1730000000000, "s3cret");
/// assert_eq!(sig.len(), 64);
/// ```
pub fn calculate_signature(username: &str, timestamp: i64, shared_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}:{}", username, timestamp, shared_secret).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Validate a provided signature against the calculated one.
///
/// Comparison ignores ASCII case of the hex digits.
pub fn validate_signature(
    provided: &str,
    username: &str,
    timestamp: i64,
    shared_secret: &str,
) -> Result<(), ApiAuthError> {
    let calculated = calculate_signature(username, timestamp, shared_secret);
    if !provided.trim().eq_ignore_ascii_case(&calculated) {
        return Err(ApiAuthError::InvalidSignature);
    }
    Ok(())
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_730_000_000_000;

    #[test]
    fn test_timestamp_window_boundaries() {
        assert!(validate_timestamp(NOW, NOW, 1000).is_ok());
        assert!(validate_timestamp(NOW - 1000, NOW, 1000).is_ok());
        assert!(validate_timestamp(NOW + 1000, NOW, 1000).is_ok());
        assert!(validate_timestamp(NOW - 1001, NOW, 1000).is_err());
        assert!(validate_timestamp(NOW + 1001, NOW, 1000).is_err());
    }

    #[test]
    fn test_timestamp_error_reason() {
        let err = validate_timestamp(NOW - 5000, NOW, 1000).unwrap_err();
        match err {
            ApiAuthError::InvalidTimestamp { reason, .. } => assert!(reason.contains("too old")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_signature_deterministic() {
        let a = calculate_signature("alice", NOW, "secret");
        let b = calculate_signature("alice", NOW, "secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));

        assert_ne!(a, calculate_signature("bob", NOW, "secret"));
        assert_ne!(a, calculate_signature("alice", NOW + 1, "secret"));
        assert_ne!(a, calculate_signature("alice", NOW, "other"));
    }

    #[test]
    fn test_known_signature_vector() {
        // sha256("u:1:s")
        let mut hasher = Sha256::new();
        hasher.update(b"u:1:s");
        let expected = format!("{:x}", hasher.finalize());
        assert_eq!(calculate_signature("u", 1, "s"), expected);
    }

    #[test]
    fn test_validate_signature() {
        let sig = calculate_signature("alice", NOW, "secret");
        assert!(validate_signature(&sig, "alice", NOW, "secret").is_ok());
        assert!(validate_signature(&sig.to_uppercase(), "alice", NOW, "secret").is_ok());
        assert_eq!(
            validate_signature("deadbeef", "alice", NOW, "secret"),
            Err(ApiAuthError::InvalidSignature)
        );
    }
}
