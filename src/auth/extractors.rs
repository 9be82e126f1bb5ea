use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::{
        claims::{AdminRole, PrincipalKind},
        jwt::AuthError,
        membership::{self, Membership},
        repo_types::Admin,
    },
    error::{ApiError, ErrorKind},
    state::AppState,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BearerError {
    #[error("missing Authorization header")]
    Missing,
    #[error("Authorization header is not a bearer token")]
    Malformed,
}

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, BearerError> {
    let raw = headers
        .get(AUTHORIZATION)
        .ok_or(BearerError::Missing)?
        .to_str()
        .map_err(|_| BearerError::Malformed)?;

    let token = raw
        .strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))
        .ok_or(BearerError::Malformed)?
        .trim();

    if token.is_empty() {
        return Err(BearerError::Malformed);
    }
    Ok(token)
}

fn retrieve_rejection(scope: &str, reason: BearerError) -> ApiError {
    warn!(%reason, "no bearer token");
    ApiError::new(
        ErrorKind::AuthRequired,
        format!("{scope}.retrieve_token"),
        "authentication required",
        reason.to_string(),
    )
}

fn invalid_token(scope: &str, reason: AuthError) -> ApiError {
    warn!(%reason, "token refused");
    ApiError::new(
        ErrorKind::InvalidToken,
        format!("{scope}.invalid_token"),
        "authentication failed",
        "invalid or expired token",
    )
}

/// A verified user. Holds the account id from the token subject.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        const SCOPE: &str = "authentication";
        let token =
            bearer_token(&parts.headers).map_err(|e| retrieve_rejection(SCOPE, e))?;
        let claims = state
            .tokens
            .verify(token, PrincipalKind::User)
            .map_err(|e| invalid_token(SCOPE, e))?;
        Ok(AuthUser(claims.sub))
    }
}

/// A verified admin whose account still exists.
#[derive(Debug, Clone)]
pub struct AuthAdmin {
    pub admin: Admin,
    pub role: AdminRole,
}

impl AuthAdmin {
    pub fn require_super(&self) -> Result<(), ApiError> {
        if self.role == AdminRole::Super && self.admin.is_super {
            return Ok(());
        }
        warn!(admin_id = %self.admin.id, "super admin required");
        Err(ApiError::forbidden(
            "admin.authorization.require_super",
            "insufficient privileges",
            "super admin role required",
        ))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        const SCOPE: &str = "admin.authentication";
        let token =
            bearer_token(&parts.headers).map_err(|e| retrieve_rejection(SCOPE, e))?;
        let claims = state
            .tokens
            .verify(token, PrincipalKind::Admin)
            .map_err(|e| invalid_token(SCOPE, e))?;

        let admin = state
            .admins
            .find_by_id(claims.sub)
            .await
            .map_err(|e| {
                ApiError::upstream("admin.authentication.find_admin", "authentication failed", e)
            })?
            .ok_or_else(|| {
                warn!(admin_id = %claims.sub, "token for deleted admin");
                invalid_token(SCOPE, AuthError::MalformedToken)
            })?;

        // Claims are checked by shape_matches, so an admin token always carries a role.
        let role = claims.role.unwrap_or(AdminRole::Admin);
        Ok(AuthAdmin { admin, role })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Membership {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        membership::resolve(&state.tokens, state.profiles.as_ref(), &parts.headers)
            .await
            .map_err(|e| {
                ApiError::upstream("membership.find_recruiter", "failed to resolve membership", e)
            })
    }
}
