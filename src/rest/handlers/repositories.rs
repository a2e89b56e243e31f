use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

use crate::{
    pagination::PageParams,
    storage::{EntryScope, Storage, StorageRead},
    types::{MedialogError, Repository, RepositoryForm},
};

use super::{entries_page, parse_id, scope_summary};
use crate::rest::{
    error::ApiError,
    extract::{ApiUser, JsonBody, Params},
    models::{MessageResponse, SummaryResponse},
    AppState,
};

fn validate(form: &RepositoryForm) -> Result<(), MedialogError> {
    if form.slug.trim().is_empty() {
        return Err(MedialogError::MissingField("slug"));
    }
    if form.title.trim().is_empty() {
        return Err(MedialogError::MissingField("title"));
    }
    Ok(())
}

pub(crate) fn find<S: StorageRead>(storage: &S, id: i64) -> Result<Repository, ApiError> {
    storage
        .load_repository(id)?
        .ok_or_else(|| ApiError::not_found("repository", id))
}

pub async fn list<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
) -> Result<Json<Vec<Repository>>, ApiError> {
    Ok(Json(state.storage.list_repositories()?))
}

pub async fn show<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Path(id): Path<String>,
) -> Result<Json<Repository>, ApiError> {
    Ok(Json(find(&state.storage, parse_id(&id)?)?))
}

pub async fn create<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    caller: ApiUser,
    JsonBody(form): JsonBody<RepositoryForm>,
) -> Result<Response, ApiError> {
    validate(&form)?;
    let mut repository = Repository::new(form, caller.user.id, Utc::now());
    repository.id = state.storage.insert_repository(&repository)?;
    log::info!("📁 repository {} created ({})", repository.id, repository.slug);
    Ok((StatusCode::CREATED, Json(repository)).into_response())
}

pub async fn update<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    caller: ApiUser,
    Path(id): Path<String>,
    JsonBody(form): JsonBody<RepositoryForm>,
) -> Result<Json<Repository>, ApiError> {
    let mut repository = find(&state.storage, parse_id(&id)?)?;
    validate(&form)?;
    repository.apply(form, caller.user.id, Utc::now());
    state.storage.update_repository(&repository)?;
    Ok(Json(repository))
}

pub async fn delete<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    if state.storage.delete_repository(id)? == 0 {
        return Err(ApiError::not_found("repository", id));
    }
    log::info!("🗑️ repository {} deleted", id);
    Ok(Json(MessageResponse::new(format!("repository {id} deleted"))))
}

pub async fn entries<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Path(id): Path<String>,
    Params(params): Params<PageParams>,
) -> Result<Response, ApiError> {
    let repository = find(&state.storage, parse_id(&id)?)?;
    entries_page(&state.storage, EntryScope::Repository(repository.id), &params)
}

pub async fn summary<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Path(id): Path<String>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let repository = find(&state.storage, parse_id(&id)?)?;
    Ok(Json(scope_summary(
        &state.storage,
        &EntryScope::Repository(repository.id),
    )?))
}
