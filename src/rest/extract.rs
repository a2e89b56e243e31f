//! Request extractors: authenticated callers and bodies whose rejections
//! render as JSON errors.

use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequest, FromRequestParts, Query, Request},
    http::{header, request::Parts, HeaderMap},
    Form, Json,
};
use chrono::Utc;
use serde::de::DeserializeOwned;

use crate::auth::{self, SESSION_COOKIE, TOKEN_HEADER};
use crate::storage::Storage;
use crate::types::{Token, TokenKind, User};

use super::{error::ApiError, AppState};

/// Caller authenticated with an `api` token in the `X-Medialog-Token`
/// header.
pub struct ApiUser {
    pub user: User,
    pub token: Token,
}

/// Caller authenticated with an `application` token in the session cookie.
pub struct SessionUser {
    pub user: User,
    pub token: Token,
}

/// Session caller with the admin flag set.
pub struct AdminUser(pub User);

#[async_trait]
impl<S> FromRequestParts<AppState<S>> for ApiUser
where
    S: Storage + Clone + Send + Sync + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(TOKEN_HEADER)
            .and_then(|h| h.to_str().ok());
        let (user, token) =
            auth::authenticate(&state.storage, presented, TokenKind::Api, Utc::now())?;
        Ok(ApiUser { user, token })
    }
}

#[async_trait]
impl<S> FromRequestParts<AppState<S>> for SessionUser
where
    S: Storage + Clone + Send + Sync + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let presented = cookie_value(&parts.headers, SESSION_COOKIE);
        let (user, token) = auth::authenticate(
            &state.storage,
            presented.as_deref(),
            TokenKind::Application,
            Utc::now(),
        )?;
        Ok(SessionUser { user, token })
    }
}

#[async_trait]
impl<S> FromRequestParts<AppState<S>> for AdminUser
where
    S: Storage + Clone + Send + Sync + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let session = SessionUser::from_request_parts(parts, state).await?;
        if !session.user.is_admin {
            return Err(auth::AuthError::NotAdmin.into());
        }
        Ok(AdminUser(session.user))
    }
}

pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}

pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; Max-Age={max_age_secs}; SameSite=Lax")
}

/// First `X-Forwarded-For` hop, else the peer address, else empty.
pub struct ClientIp(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.split(',').next())
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty());
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        Ok(ClientIp(forwarded.or(peer).unwrap_or_default()))
    }
}

/// `Json` whose rejection is a 400 with a JSON message.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(JsonBody(value))
    }
}

/// `Form` whose rejection is a 400 with a JSON message.
pub struct FormBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for FormBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(FormBody(value))
    }
}

/// `Query` whose rejection is a 400 with a JSON message.
pub struct Params<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Params<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Params(value))
    }
}
