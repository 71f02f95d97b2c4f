//! Bearer token extraction from the `Authorization` header

use crate::error::{AuthError, AuthResult};

/// Pull the token out of an `Authorization` header value.
///
/// The value is split on whitespace. The checks run in a fixed order: the
/// scheme is validated first (case-insensitive `bearer`), then a lone scheme
/// is reported as a missing token, then anything beyond two parts is
/// rejected. An absent, empty or all-whitespace header counts as missing.
///
/// ```
/// use patisserie_auth::extract_bearer_token;
///
/// assert_eq!(extract_bearer_token(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
/// assert!(extract_bearer_token(None).is_err());
/// ```
///
/// # Errors
///
/// Returns the matching [`AuthError`] header variant when the value is not
/// exactly `Bearer <token>`.
pub fn extract_bearer_token(header: Option<&str>) -> AuthResult<&str> {
    let header = header.ok_or(AuthError::HeaderMissing)?;
    let parts: Vec<&str> = header.split_whitespace().collect();

    let Some(scheme) = parts.first() else {
        return Err(AuthError::HeaderMissing);
    };

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidScheme);
    }

    match parts.as_slice() {
        [_] => Err(AuthError::TokenNotFound),
        [_, token] => Ok(token),
        _ => Err(AuthError::NotBearerToken),
    }
}

/// Same as [`extract_bearer_token`] but reading straight from a header map
///
/// A value that is not visible ASCII cannot carry a bearer scheme and is
/// reported as [`AuthError::InvalidScheme`].
///
/// # Errors
///
/// See [`extract_bearer_token`].
pub fn bearer_from_headers(headers: &http::HeaderMap) -> AuthResult<&str> {
    match headers.get(http::header::AUTHORIZATION) {
        None => Err(AuthError::HeaderMissing),
        Some(value) => {
            let value = value.to_str().map_err(|_| AuthError::InvalidScheme)?;
            extract_bearer_token(Some(value))
        }
    }
}
