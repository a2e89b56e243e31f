use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    pagination::PageParams,
    storage::{EntryScope, Storage, StorageRead, StorageTx, StorageWrite},
    types::{MedialogError, Resource, ResourceForm},
};

use super::{csv_response, entries_page, parse_id, repositories, scope_summary};
use crate::rest::{
    error::ApiError,
    extract::{ApiUser, JsonBody, Params},
    models::{MessageResponse, SummaryResponse},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub repository_id: Option<String>,
}

pub(crate) fn find<S: StorageRead>(storage: &S, id: i64) -> Result<Resource, ApiError> {
    storage
        .load_resource(id)?
        .ok_or_else(|| ApiError::not_found("resource", id))
}

fn validate<S: StorageRead>(storage: &S, form: &ResourceForm) -> Result<(), ApiError> {
    if form.title.trim().is_empty() {
        return Err(MedialogError::MissingField("title").into());
    }
    if form.collection_code.trim().is_empty() {
        return Err(MedialogError::MissingField("collection_code").into());
    }
    if storage.load_repository(form.repository_id)?.is_none() {
        return Err(ApiError::bad_request(format!(
            "repository {} does not exist",
            form.repository_id
        )));
    }
    Ok(())
}

pub async fn list<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Params(params): Params<ListParams>,
) -> Result<Json<Vec<Resource>>, ApiError> {
    let repository_id = match params.repository_id.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Some(parse_id(raw)?),
        _ => None,
    };
    Ok(Json(state.storage.list_resources(repository_id)?))
}

pub async fn show<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Path(id): Path<String>,
) -> Result<Json<Resource>, ApiError> {
    Ok(Json(find(&state.storage, parse_id(&id)?)?))
}

pub async fn create<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    caller: ApiUser,
    JsonBody(form): JsonBody<ResourceForm>,
) -> Result<Response, ApiError> {
    validate(&state.storage, &form)?;
    let mut resource = Resource::new(form, caller.user.id, Utc::now());
    resource.id = state.storage.insert_resource(&resource)?;
    log::info!(
        "📁 resource {} created ({})",
        resource.id,
        resource.collection_code
    );
    Ok((StatusCode::CREATED, Json(resource)).into_response())
}

pub async fn update<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    caller: ApiUser,
    Path(id): Path<String>,
    JsonBody(form): JsonBody<ResourceForm>,
) -> Result<Json<Resource>, ApiError> {
    let mut resource = find(&state.storage, parse_id(&id)?)?;
    validate(&state.storage, &form)?;
    resource.apply(form, caller.user.id, Utc::now());
    let tx = state.storage.begin_tx()?;
    tx.update_resource(&resource)?;
    let moved = tx.reassign_resource_entries(resource.id, resource.repository_id)?;
    tx.commit()?;
    log::debug!(
        "📁 resource {} updated, {} entries under repository {}",
        resource.id,
        moved,
        resource.repository_id
    );
    Ok(Json(resource))
}

pub async fn delete<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    if state.storage.delete_resource(id)? == 0 {
        return Err(ApiError::not_found("resource", id));
    }
    log::info!("🗑️ resource {} deleted", id);
    Ok(Json(MessageResponse::new(format!("resource {id} deleted"))))
}

pub async fn entries<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Path(id): Path<String>,
    Params(params): Params<PageParams>,
) -> Result<Response, ApiError> {
    let resource = find(&state.storage, parse_id(&id)?)?;
    entries_page(&state.storage, EntryScope::Resource(resource.id), &params)
}

pub async fn summary<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Path(id): Path<String>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let resource = find(&state.storage, parse_id(&id)?)?;
    Ok(Json(scope_summary(
        &state.storage,
        &EntryScope::Resource(resource.id),
    )?))
}

pub async fn csv<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let resource = find(&state.storage, parse_id(&id)?)?;
    let repository = repositories::find(&state.storage, resource.repository_id)?;
    let rows = state.storage.csv_rows(&EntryScope::Resource(resource.id), None)?;
    let filename = format!("{}_{}.csv", repository.slug, resource.collection_code);
    csv_response(&rows, &filename)
}
