//! Admin authentication middleware and token utilities.
//!
//! # Overview
//! This module provides [`AdminUser`], an Actix Web extractor that verifies a
//! bearer token locally (HS256 signature + expiry against the shared secret)
//! and enforces the `admin` role claim. Every admin-only route takes an
//! `AdminUser` argument; rejection happens before the handler body runs.
//!
//! Tokens are opaque bearer credentials valid for a fixed 24-hour window from
//! issuance. There is no refresh mechanism.
//!
//! # Errors
//! Each rejection carries a stable machine-readable `code` so clients can
//! distinguish a missing header from a malformed one, a bad signature, an
//! expired token, and a non-admin role. The guard fails closed.

use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, http::StatusCode, web};
use chrono::Utc;
use futures::future::{Ready, ready};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use thiserror::Error;

use crate::AppState;

/// Token lifetime: 24 hours from issuance.
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Claims carried by an admin bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Fixed account identifier of the single admin credential pair.
    pub id: i64,
    /// Username the token was issued to.
    pub username: String,
    /// Role claim; must be `"admin"` to pass the guard.
    pub role: String,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// Authentication failure, rendered as `{ "error": ..., "code": ... }`.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Access denied. No token provided.")]
    NoToken,
    #[error("Access denied. Invalid token format.")]
    InvalidTokenFormat,
    #[error("Access denied. Invalid token.")]
    InvalidToken,
    #[error("Access denied. Token expired.")]
    TokenExpired,
    #[error("Access denied. Admin privileges required.")]
    InsufficientPrivileges,
    #[error("Internal server error during authentication.")]
    Internal,
}

impl AuthError {
    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::NoToken => "NO_TOKEN",
            AuthError::InvalidTokenFormat => "INVALID_TOKEN_FORMAT",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::InsufficientPrivileges => "INSUFFICIENT_PRIVILEGES",
            AuthError::Internal => "AUTH_ERROR",
        }
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InsufficientPrivileges => StatusCode::FORBIDDEN,
            AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        }))
    }
}

/// Signs a fresh admin token for the given username.
///
/// Returns the encoded token together with its claims so callers can echo
/// the user block and expiry back to the client.
pub fn issue_admin_token(
    username: &str,
    secret: &str,
) -> Result<(String, AdminClaims), jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = AdminClaims {
        id: 1,
        username: username.to_string(),
        role: "admin".to_string(),
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };
    let token = sign_claims(&claims, secret)?;
    Ok((token, claims))
}

/// Signs arbitrary claims. Split out of [`issue_admin_token`] so tests can
/// mint expired or non-admin tokens.
pub fn sign_claims(
    claims: &AdminClaims,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verifies signature and expiry, returning the decoded claims.
pub fn verify_token(token: &str, secret: &str) -> Result<AdminClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })
}

/// Extracts and verifies the bearer token from an `Authorization` header
/// value, then enforces the admin role.
pub fn authorize_admin(auth_header: Option<&str>, secret: &str) -> Result<AdminClaims, AuthError> {
    let header = auth_header.ok_or(AuthError::NoToken)?;
    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidTokenFormat)?;
    let claims = verify_token(token, secret)?;
    if claims.role != "admin" {
        return Err(AuthError::InsufficientPrivileges);
    }
    Ok(claims)
}

/// Actix Web extractor for admin-only routes.
///
/// Handlers add `admin: AdminUser` as an argument; the decoded claims are
/// available through `Deref`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AdminClaims);

impl Deref for AdminUser {
    type Target = AdminClaims;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for AdminUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            tracing::error!("AppState missing while authenticating an admin request");
            return ready(Err(AuthError::Internal));
        };
        let auth_header = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok());
        let result = authorize_admin(auth_header, &state.jwt_secret);
        if let Err(e) = &result {
            tracing::warn!(
                path = %req.path(),
                code = %e.code(),
                "rejected admin request"
            );
        }
        ready(result.map(AdminUser))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn claims_with(role: &str, exp_offset: i64) -> AdminClaims {
        let now = Utc::now().timestamp();
        AdminClaims {
            id: 1,
            username: "admin".to_string(),
            role: role.to_string(),
            iat: now,
            exp: now + exp_offset,
        }
    }

    #[test]
    fn roundtrip_keeps_claims() {
        let (token, claims) = issue_admin_token("admin", SECRET).unwrap();
        let decoded = verify_token(&token, SECRET).unwrap();
        assert_eq!(decoded.username, "admin");
        assert_eq!(decoded.role, "admin");
        assert_eq!(decoded.exp, claims.iat + TOKEN_TTL_SECS);
    }

    #[test]
    fn missing_header_is_no_token() {
        let err = authorize_admin(None, SECRET).unwrap_err();
        assert_eq!(err.code(), "NO_TOKEN");
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn header_without_token_segment_is_malformed() {
        let err = authorize_admin(Some("Bearer "), SECRET).unwrap_err();
        assert_eq!(err.code(), "INVALID_TOKEN_FORMAT");
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = sign_claims(&claims_with("admin", 3600), "other-secret").unwrap();
        let err = authorize_admin(Some(&format!("Bearer {token}")), SECRET).unwrap_err();
        assert_eq!(err.code(), "INVALID_TOKEN");
    }

    #[test]
    fn expired_token_is_rejected_with_code() {
        let token = sign_claims(&claims_with("admin", -120), SECRET).unwrap();
        let err = authorize_admin(Some(&format!("Bearer {token}")), SECRET).unwrap_err();
        assert_eq!(err.code(), "TOKEN_EXPIRED");
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn non_admin_role_is_forbidden() {
        let token = sign_claims(&claims_with("editor", 3600), SECRET).unwrap();
        let err = authorize_admin(Some(&format!("Bearer {token}")), SECRET).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_PRIVILEGES");
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
