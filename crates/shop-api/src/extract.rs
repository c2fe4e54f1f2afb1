//! # Extractors
//!
//! JSON bodies with the API error envelope, and the authenticated-user
//! extractors used by protected routes.
//!
//! A token is read from `Authorization: Bearer <token>` first, then from
//! the auth cookie.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header, request::Parts},
};
use cookie::Cookie;
use shop_core::{Role, ShopError, User};

const NOT_AUTHENTICATED: &str = "User is not authenticated!";

/// `axum::Json` whose rejection is rendered as a 400 envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// The user behind the request's token.
///
/// ```rust,ignore
/// async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
///     Json(user)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| cookie_token(parts, &state.cookie.name))
            .ok_or_else(|| ShopError::unauthenticated(NOT_AUTHENTICATED))?;

        let user = state.auth.authenticate(&token).await?;
        Ok(Self(user))
    }
}

/// Authenticated user holding the Admin role
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        require_role(user, Role::Admin).map(Self)
    }
}

/// Authenticated user holding the Customer role
#[derive(Debug, Clone)]
pub struct RequireCustomer(pub User);

impl FromRequestParts<AppState> for RequireCustomer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        require_role(user, Role::Customer).map(Self)
    }
}

fn require_role(user: User, role: Role) -> Result<User, ApiError> {
    if user.has_role(role) {
        Ok(user)
    } else {
        Err(ShopError::Forbidden(format!(
            "{} not authorized for this resource!",
            user.role
        ))
        .into())
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn cookie_token(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}
