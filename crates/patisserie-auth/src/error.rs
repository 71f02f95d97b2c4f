//! Authorization failures
//!
//! Every stage of the gate reports through [`AuthError`]. Each variant names a
//! single failure cause, and [`AuthError::failure`] collapses it into the
//! `(code, description, status)` triple that is rendered to clients.

use http::StatusCode;

/// A failed authorization step.
///
/// The `Display` output is the client-facing description; detail carried by
/// [`AuthError::Undecodable`] and [`AuthError::KeySetUnavailable`] is only
/// meant for logs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header, or an empty one
    #[error("Authorization header is expected.")]
    HeaderMissing,

    /// The header does not open with the `Bearer` scheme
    #[error("Authorization header must start with \"Bearer\".")]
    InvalidScheme,

    /// `Bearer` with nothing after it
    #[error("Token not found.")]
    TokenNotFound,

    /// More than two whitespace-separated parts
    #[error("Authorization header must be bearer token.")]
    NotBearerToken,

    /// Token header carries no `kid`
    #[error("Authorization malformed.")]
    MissingKeyId,

    /// No key in the key set matches the token's `kid`
    #[error("Unable to find the appropriate key.")]
    KeyNotFound,

    /// `exp` is in the past
    #[error("Token expired.")]
    TokenExpired,

    /// Issuer or audience mismatch, or a required registered claim is absent
    #[error("Incorrect claims. Please, check the audience and issuer.")]
    InvalidClaims,

    /// Signature, algorithm or encoding problem
    #[error("Unable to parse authentication token.")]
    Undecodable(String),

    /// Verified token has no `permissions` claim
    #[error("Permissions not included in the token!")]
    PermissionsMissing,

    /// Required permission is not granted
    #[error("Permissions not found")]
    PermissionDenied,

    /// The identity provider's key set could not be fetched or parsed
    #[error("Unable to fetch the signing key set.")]
    KeySetUnavailable(String),
}

impl AuthError {
    /// Machine-readable failure code
    pub fn code(&self) -> &'static str {
        match self {
            Self::HeaderMissing => "authorization_header_missing",
            Self::InvalidScheme
            | Self::TokenNotFound
            | Self::NotBearerToken
            | Self::MissingKeyId
            | Self::KeyNotFound
            | Self::Undecodable(_) => "invalid_header",
            Self::TokenExpired => "token_expired",
            Self::InvalidClaims | Self::PermissionsMissing => "invalid_claims",
            Self::PermissionDenied => "unauthorized",
            Self::KeySetUnavailable(_) => "key_set_unavailable",
        }
    }

    /// HTTP status the failure is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            Self::HeaderMissing
            | Self::InvalidScheme
            | Self::TokenNotFound
            | Self::NotBearerToken
            | Self::MissingKeyId
            | Self::TokenExpired
            | Self::InvalidClaims => StatusCode::UNAUTHORIZED,
            Self::KeyNotFound | Self::Undecodable(_) | Self::PermissionsMissing => {
                StatusCode::BAD_REQUEST
            }
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::KeySetUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Collapse into the reportable triple
    pub fn failure(&self) -> AuthFailure {
        AuthFailure {
            code: self.code(),
            description: self.to_string(),
            status: self.status(),
        }
    }
}

/// The `(code, description, status)` triple a failed request is answered with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    /// Machine-readable code such as `invalid_header`
    pub code: &'static str,
    /// Human-readable description
    pub description: String,
    /// HTTP status
    pub status: StatusCode,
}

impl AuthFailure {
    /// JSON body: `{"success": false, "error": <status>, "code": .., "message": ..}`
    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({
            "success": false,
            "error": self.status.as_u16(),
            "code": self.code,
            "message": self.description,
        })
    }

    /// Render as an HTTP response with any body type buildable from a `String`
    pub fn into_http_response<B: From<String>>(self) -> http::Response<B> {
        let mut response = http::Response::new(B::from(self.body().to_string()));
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        if self.status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                http::header::WWW_AUTHENTICATE,
                http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

impl From<AuthError> for AuthFailure {
    fn from(error: AuthError) -> Self {
        error.failure()
    }
}

/// Result alias for the authorization core
pub type AuthResult<T> = Result<T, AuthError>;
