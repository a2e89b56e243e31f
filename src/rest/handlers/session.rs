use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    auth::{self, TOKEN_LIFETIME_HOURS},
    storage::Storage,
    types::{Token, TokenKind},
};

use crate::rest::{
    error::ApiError,
    extract::{session_cookie, ApiUser, ClientIp, FormBody, Params, SessionUser},
    models::{DashboardResponse, MessageResponse, SessionResponse},
    AppState,
};

const RECENT_ENTRIES: u32 = 10;

#[derive(Debug, Default, Deserialize)]
pub struct PasswordParams {
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    pub password: Option<String>,
}

pub async fn api_login<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ClientIp(ip): ClientIp,
    Path(email): Path<String>,
    Params(params): Params<PasswordParams>,
) -> Result<Json<Token>, ApiError> {
    let (_user, token) = auth::login(
        &state.storage,
        &email,
        params.password.as_deref(),
        TokenKind::Api,
        &ip,
        Utc::now(),
    )?;
    Ok(Json(token))
}

pub async fn api_logout<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    caller: ApiUser,
) -> Result<Json<MessageResponse>, ApiError> {
    state.storage.expire_token(caller.token.id)?;
    log::info!("👋 {} logged out", caller.user.email);
    Ok(Json(MessageResponse::new("logged out")))
}

/// Invalidate every browser session.
pub async fn delete_sessions<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    caller: ApiUser,
) -> Result<Json<MessageResponse>, ApiError> {
    let expired = state
        .storage
        .expire_tokens(Some(TokenKind::Application))?;
    log::info!(
        "🧹 {} application sessions invalidated by {}",
        expired,
        caller.user.email
    );
    Ok(Json(MessageResponse::new(format!(
        "{expired} sessions deleted"
    ))))
}

pub async fn authenticate<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ClientIp(ip): ClientIp,
    FormBody(form): FormBody<LoginForm>,
) -> Result<Response, ApiError> {
    let (_user, token) = auth::login(
        &state.storage,
        &form.email,
        form.password.as_deref(),
        TokenKind::Application,
        &ip,
        Utc::now(),
    )?;
    let cookie = session_cookie(&token.token, TOKEN_LIFETIME_HOURS * 3600);
    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, "/".to_string()), (header::SET_COOKIE, cookie)],
    )
        .into_response())
}

pub async fn logout<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    session: Option<SessionUser>,
) -> Result<Response, ApiError> {
    if let Some(session) = session {
        state.storage.expire_token(session.token.id)?;
        log::info!("👋 {} logged out", session.user.email);
    }
    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, session_cookie("", 0)),
        ],
    )
        .into_response())
}

pub async fn dashboard<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    session: SessionUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    Ok(Json(DashboardResponse {
        counts: state.storage.record_counts()?,
        recent_entries: state.storage.recent_entries(RECENT_ENTRIES)?,
        user: session.user,
    }))
}

pub async fn dump(session: SessionUser) -> Json<SessionResponse> {
    Json(SessionResponse {
        user_id: session.user.id,
        email: session.user.email,
        is_admin: session.user.is_admin,
        can_access_api: session.user.can_access_api,
        expires: session.token.expires,
    })
}
