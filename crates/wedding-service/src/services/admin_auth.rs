//! Admin session issuing and verification.
//!
//! The admin password is checked with bcrypt against the configured hash;
//! a match yields a short-lived HS256 session token. Admin routes verify
//! that token on every request.

use crate::errors::WeddingError;
use crate::observability::metrics;
use common::jwt::{AdminClaims, IssuedToken, SessionKeys, SessionTokenError};
use common::secret::{ExposeSecret, SecretString};
use tracing::instrument;

/// Longest password accepted before hashing. bcrypt ignores bytes past 72.
pub const MAX_PASSWORD_BYTES: usize = 128;

/// Admin authentication service.
pub struct AdminAuthService;

impl AdminAuthService {
    /// Exchange the admin password for a session token.
    ///
    /// # Errors
    ///
    /// - `WeddingError::InvalidCredentials` - password does not match
    /// - `WeddingError::Internal` - hash verification or signing failed
    #[instrument(skip_all, name = "wedding.services.admin_login")]
    pub async fn login(
        password_hash: &SecretString,
        keys: &SessionKeys,
        password: SecretString,
    ) -> Result<IssuedToken, WeddingError> {
        let supplied = password.expose_secret();
        if supplied.is_empty() || supplied.len() > MAX_PASSWORD_BYTES {
            metrics::record_admin_login("invalid_credentials");
            return Err(WeddingError::InvalidCredentials);
        }

        let hash = password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || {
            bcrypt::verify(password.expose_secret(), hash.expose_secret())
        })
        .await
        .map_err(|e| {
            tracing::error!(target: "wedding.services.admin_auth", error = %e, "Password verification task failed");
            metrics::record_admin_login("error");
            WeddingError::Internal
        })?
        .map_err(|e| {
            tracing::error!(target: "wedding.services.admin_auth", error = %e, "Password verification failed");
            metrics::record_admin_login("error");
            WeddingError::Internal
        })?;

        if !verified {
            tracing::warn!(target: "wedding.services.admin_auth", "Admin login rejected");
            metrics::record_admin_login("invalid_credentials");
            return Err(WeddingError::InvalidCredentials);
        }

        let issued = keys.issue().map_err(|e| {
            tracing::error!(target: "wedding.services.admin_auth", error = %e, "Failed to sign session token");
            metrics::record_admin_login("error");
            WeddingError::Internal
        })?;

        tracing::info!(
            target: "wedding.services.admin_auth",
            expires_in = issued.expires_in,
            "Admin session issued"
        );
        metrics::record_admin_login("success");

        Ok(issued)
    }

    /// Verify a bearer token presented on an admin route.
    pub fn verify(keys: &SessionKeys, token: &str) -> Result<AdminClaims, WeddingError> {
        keys.verify(token).map_err(|e| {
            let reason = match e {
                SessionTokenError::Expired => "expired",
                SessionTokenError::TokenTooLarge => "too_large",
                SessionTokenError::IatTooFarInFuture => "iat_in_future",
                SessionTokenError::Invalid | SessionTokenError::Signing(_) => "invalid",
            };
            tracing::debug!(target: "wedding.services.admin_auth", reason, "Session token rejected");
            metrics::record_admin_token_rejection(reason);
            WeddingError::InvalidToken(e.to_string())
        })
    }
}
