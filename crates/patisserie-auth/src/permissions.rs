//! Scope checks on verified claims

use tracing::debug;

use crate::error::{AuthError, AuthResult};
use crate::jwt::VerifiedClaims;

/// Check that `claims` grant `required`.
///
/// The `permissions` claim must be present even when nothing is required; an
/// empty `required` only skips the membership test.
///
/// # Errors
///
/// - [`AuthError::PermissionsMissing`] if the token has no `permissions` claim
/// - [`AuthError::PermissionDenied`] if `required` is not among them
pub fn check_permissions(required: &str, claims: &VerifiedClaims) -> AuthResult<()> {
    let Some(granted) = claims.permissions.as_ref() else {
        debug!(subject = ?claims.sub, "Token carries no permissions claim");
        return Err(AuthError::PermissionsMissing);
    };

    if !required.is_empty() && !granted.iter().any(|p| p == required) {
        debug!(
            subject = ?claims.sub,
            required = required,
            "Required permission not granted"
        );
        return Err(AuthError::PermissionDenied);
    }

    Ok(())
}
