//! Token-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use terraconsole_core::error::CoreError;
use terraconsole_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated principal extracted from the `Authorization` header.
///
/// Accepts `Bearer <token>` and `Basic base64(<user>:<token>)`. The Basic form
/// exists because Terraform's HTTP backend can only send basic credentials;
/// the username is ignored and the password is the token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The principal's id (from `claims.sub`).
    pub user_id: DbId,
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.into()))
}

/// Pull the raw token out of an `Authorization` header value.
fn extract_token(header: &str) -> Result<String, AppError> {
    if let Some(token) = header.strip_prefix("Bearer ") {
        return Ok(token.trim().to_string());
    }

    if let Some(encoded) = header.strip_prefix("Basic ") {
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|_| unauthorized("Malformed Basic credentials"))?;
        let credentials =
            String::from_utf8(decoded).map_err(|_| unauthorized("Malformed Basic credentials"))?;
        let (_, password) = credentials
            .split_once(':')
            .ok_or_else(|| unauthorized("Malformed Basic credentials"))?;
        return Ok(password.to_string());
    }

    Err(unauthorized(
        "Invalid Authorization format. Expected: Bearer <token>",
    ))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = extract_token(auth_header)?;

        let claims = validate_token(&token, &state.config.jwt)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}
