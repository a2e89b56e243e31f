use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    auth::{self, AuthError},
    storage::{Storage, StorageRead},
    types::{User, UserFlag, UserForm},
};

use super::parse_id;
use crate::rest::{
    error::ApiError,
    extract::{AdminUser, FormBody, SessionUser},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct PasswordForm {
    #[serde(default)]
    pub password: String,
}

fn find<S: StorageRead>(storage: &S, id: i64) -> Result<User, ApiError> {
    storage
        .load_user(id)?
        .ok_or_else(|| ApiError::not_found("user", id))
}

pub async fn list<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _admin: AdminUser,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.storage.list_users()?))
}

pub async fn create<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AdminUser(admin): AdminUser,
    FormBody(form): FormBody<UserForm>,
) -> Result<Response, ApiError> {
    let mut user = auth::new_user(&form, admin.id, Utc::now())?;
    user.id = state.storage.insert_user(&user)?;
    log::info!("👤 user {} created by {}", user.email, admin.email);
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

/// Admins may reset anyone's password; other users only their own.
pub async fn reset_password<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    session: SessionUser,
    Path(id): Path<String>,
    FormBody(form): FormBody<PasswordForm>,
) -> Result<Json<User>, ApiError> {
    let id = parse_id(&id)?;
    if !session.user.is_admin && session.user.id != id {
        return Err(AuthError::NotAdmin.into());
    }
    let mut user = find(&state.storage, id)?;
    auth::set_password(&mut user, &form.password, session.user.id, Utc::now())?;
    state.storage.update_user(&user)?;
    log::info!("🔐 password reset for {}", user.email);
    Ok(Json(user))
}

async fn set_flag<S: Storage + Clone + Send + Sync + 'static>(
    state: AppState<S>,
    admin: User,
    raw_id: &str,
    flag: UserFlag,
) -> Result<Json<User>, ApiError> {
    let mut user = find(&state.storage, parse_id(raw_id)?)?;
    user.set_flag(flag, admin.id, Utc::now());
    state.storage.update_user(&user)?;
    log::info!("👤 {:?} applied to {} by {}", flag, user.email, admin.email);
    Ok(Json(user))
}

pub async fn deactivate<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    set_flag(state, admin, &id, UserFlag::Active(false)).await
}

pub async fn reactivate<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    set_flag(state, admin, &id, UserFlag::Active(true)).await
}

pub async fn make_admin<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    set_flag(state, admin, &id, UserFlag::Admin(true)).await
}

pub async fn remove_admin<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    set_flag(state, admin, &id, UserFlag::Admin(false)).await
}

pub async fn allow_api<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    set_flag(state, admin, &id, UserFlag::ApiAccess(true)).await
}

pub async fn revoke_api<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    set_flag(state, admin, &id, UserFlag::ApiAccess(false)).await
}
