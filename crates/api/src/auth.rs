//! Caller identity extractors.
//!
//! An upstream gateway authenticates requests and forwards the caller as
//! `X-User-Id: <uuid>` plus `X-User-Role: admin` for administrators.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;
use services::{Caller, Role};

use crate::error::ApiError;

/// Header carrying the authenticated user's ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the authenticated user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

const NO_TOKEN: &str = "Not authorized, no token";

/// Extractor that requires an authenticated caller.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(AuthUser(caller): AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", caller.user_id)
/// }
/// ```
pub struct AuthUser(pub Caller);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<UserId>().ok())
            .ok_or(ApiError::Unauthorized(NO_TOKEN))?;

        let is_admin = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("admin"));

        Ok(Self(Caller {
            user_id,
            role: if is_admin { Role::Admin } else { Role::Customer },
        }))
    }
}

/// Extractor that requires an authenticated administrator.
///
/// Missing identity is 401; a non-admin caller is 403.
pub struct AdminUser(pub Caller);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(caller) = AuthUser::from_request_parts(parts, state).await?;
        if !caller.is_admin() {
            return Err(ApiError::Forbidden("Not authorized as an admin".to_string()));
        }
        Ok(Self(caller))
    }
}
