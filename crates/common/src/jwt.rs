//! Admin session tokens.
//!
//! The admin console authenticates once with the admin password and then
//! carries a short-lived HS256 JWT on every admin request. This module owns
//! issuing and verifying those tokens:
//!
//! - Size limits checked before any parsing
//! - Clock skew tolerance for `iat`
//! - Subject pinned to [`ADMIN_SUBJECT`]
//! - The `jti` field in claims is redacted in Debug output
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::SessionKeys;
//!
//! let keys = SessionKeys::from_secret(&secret, Duration::from_secs(3600));
//! let issued = keys.issue()?;
//! let claims = keys.verify(&issued.token)?;
//! ```

use crate::secret::{ExposeSecret, SecretString};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey};
use jsonwebtoken::{Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// Constants
// =============================================================================

/// Maximum accepted token size in bytes (8KB).
///
/// Session tokens are ~250 bytes; anything larger is rejected before
/// base64 decoding or signature verification.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Default clock skew tolerance for `iat` (5 minutes).
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Maximum configurable clock skew tolerance (10 minutes).
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// Subject carried by every admin session token.
pub const ADMIN_SUBJECT: &str = "admin";

/// Minimum length of the HMAC signing secret in bytes.
pub const MIN_SESSION_SECRET_BYTES: usize = 32;

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while issuing or verifying session tokens.
///
/// Verification failures share one generic message so callers cannot
/// distinguish a forged token from an expired one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionTokenError {
    /// Token size exceeds [`MAX_JWT_SIZE_BYTES`].
    #[error("The session token is invalid or expired")]
    TokenTooLarge,

    /// Signature, structure, or subject check failed.
    #[error("The session token is invalid or expired")]
    Invalid,

    /// `exp` is in the past.
    #[error("The session token is invalid or expired")]
    Expired,

    /// `iat` is further in the future than the clock skew allows.
    #[error("The session token is invalid or expired")]
    IatTooFarInFuture,

    /// Token could not be signed.
    #[error("Failed to sign session token: {0}")]
    Signing(String),
}

// =============================================================================
// Claims Types
// =============================================================================

/// Claims carried by an admin session token.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminClaims {
    /// Subject, always [`ADMIN_SUBJECT`].
    pub sub: String,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Unique token id - redacted in Debug output.
    pub jti: String,
}

impl fmt::Debug for AdminClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminClaims")
            .field("sub", &self.sub)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .field("jti", &"[REDACTED]")
            .finish()
    }
}

/// A freshly signed token together with its lifetime.
#[derive(Clone)]
pub struct IssuedToken {
    /// Compact JWS string.
    pub token: SecretString,

    /// Seconds until expiry.
    pub expires_in: u64,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

// =============================================================================
// Keys
// =============================================================================

/// Signing and verification keys for admin sessions.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    clock_skew: Duration,
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .field("clock_skew", &self.clock_skew)
            .finish()
    }
}

impl SessionKeys {
    /// Build keys from the shared HMAC secret.
    #[must_use]
    pub fn from_secret(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl,
            clock_skew: DEFAULT_CLOCK_SKEW,
        }
    }

    /// Override the `iat` clock skew tolerance (capped at [`MAX_CLOCK_SKEW`]).
    #[must_use]
    pub fn with_clock_skew(mut self, clock_skew: Duration) -> Self {
        self.clock_skew = clock_skew.min(MAX_CLOCK_SKEW);
        self
    }

    /// Issue a token valid from now.
    ///
    /// # Errors
    ///
    /// Returns `SessionTokenError::Signing` if encoding fails.
    pub fn issue(&self) -> Result<IssuedToken, SessionTokenError> {
        self.issue_at(chrono::Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns `SessionTokenError::Signing` if encoding fails.
    pub fn issue_at(&self, now: i64) -> Result<IssuedToken, SessionTokenError> {
        // Safe cast: ttl is bounded by configuration validation (<= 7 days)
        #[allow(clippy::cast_possible_wrap)]
        let ttl_secs = self.ttl.as_secs() as i64;

        let claims = AdminClaims {
            sub: ADMIN_SUBJECT.to_string(),
            iat: now,
            exp: now + ttl_secs,
            jti: Uuid::new_v4().to_string(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        let token = encode(&header, &claims, &self.encoding)
            .map_err(|e| SessionTokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token: SecretString::from(token),
            expires_in: self.ttl.as_secs(),
        })
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// - `TokenTooLarge` if the token exceeds [`MAX_JWT_SIZE_BYTES`]
    /// - `Expired` if `exp` has passed
    /// - `IatTooFarInFuture` if `iat` is beyond the clock skew tolerance
    /// - `Invalid` for any other failure (signature, algorithm, subject)
    pub fn verify(&self, token: &str) -> Result<AdminClaims, SessionTokenError> {
        if token.len() > MAX_JWT_SIZE_BYTES {
            tracing::debug!(
                target: "common.jwt",
                token_size = token.len(),
                max_size = MAX_JWT_SIZE_BYTES,
                "Token rejected: size exceeds maximum allowed"
            );
            return Err(SessionTokenError::TokenTooLarge);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);
        validation.sub = Some(ADMIN_SUBJECT.to_string());

        let data = decode::<AdminClaims>(token, &self.decoding, &validation).map_err(|e| {
            tracing::debug!(target: "common.jwt", error = %e, "Token rejected");
            match e.kind() {
                ErrorKind::ExpiredSignature => SessionTokenError::Expired,
                _ => SessionTokenError::Invalid,
            }
        })?;

        validate_iat(data.claims.iat, self.clock_skew)?;

        Ok(data.claims)
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Validate the `iat` (issued-at) claim with clock skew tolerance.
///
/// # Errors
///
/// Returns `SessionTokenError::IatTooFarInFuture` if `iat` is more than
/// `clock_skew` in the future.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), SessionTokenError> {
    let now = chrono::Utc::now().timestamp();
    validate_iat_at(iat, clock_skew, now)
}

/// Deterministic `iat` validation against an explicit `now` timestamp.
pub(crate) fn validate_iat_at(
    iat: i64,
    clock_skew: Duration,
    now: i64,
) -> Result<(), SessionTokenError> {
    // Safe cast: clock_skew is bounded to MAX_CLOCK_SKEW (600 seconds)
    #[allow(clippy::cast_possible_wrap)]
    let clock_skew_secs = clock_skew.as_secs() as i64;
    let max_iat = now + clock_skew_secs;

    if iat > max_iat {
        tracing::debug!(
            target: "common.jwt",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            "Token rejected: iat too far in the future"
        );
        return Err(SessionTokenError::IatTooFarInFuture);
    }

    Ok(())
}
