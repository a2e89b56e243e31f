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
    storage::{EntryScope, Storage, StorageRead},
    types::{Entry, EntryForm, MedialogError},
    vocabulary::{self, STORAGE_LOCATIONS},
};

use super::{csv_response, entries_page, parse_uuid, resources};
use crate::rest::{
    error::ApiError,
    extract::{ApiUser, JsonBody, Params},
    models::MessageResponse,
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct LocationParams {
    pub location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FindEntryForm {
    #[serde(default)]
    pub resource_id: i64,
    #[serde(default)]
    pub media_id: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct CsvParams {
    pub filter: Option<String>,
}

fn find<S: StorageRead>(storage: &S, raw_id: &str) -> Result<Entry, ApiError> {
    let id = parse_uuid(raw_id)?;
    storage
        .load_entry(id)?
        .ok_or_else(|| ApiError::not_found("entry", id))
}

fn ensure_unique_media_id<S: StorageRead>(storage: &S, entry: &Entry) -> Result<(), ApiError> {
    if storage.media_id_exists(entry.resource_id, entry.media_id, Some(entry.id))? {
        return Err(MedialogError::DuplicateMediaId {
            media_id: entry.media_id,
            resource_id: entry.resource_id,
        }
        .into());
    }
    Ok(())
}

pub async fn list<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Params(params): Params<PageParams>,
) -> Result<Response, ApiError> {
    entries_page(&state.storage, EntryScope::All, &params)
}

pub async fn show<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Path(id): Path<String>,
) -> Result<Json<Entry>, ApiError> {
    Ok(Json(find(&state.storage, &id)?))
}

/// Look an entry up by its media id within a resource.
pub async fn find_by_media_id<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    JsonBody(form): JsonBody<FindEntryForm>,
) -> Result<Json<Entry>, ApiError> {
    let resource = resources::find(&state.storage, form.resource_id)?;
    let entry = state
        .storage
        .load_entry_by_media_id(resource.id, form.media_id)?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "media id {} not found in resource {}",
                form.media_id, resource.id
            ))
        })?;
    Ok(Json(entry))
}

/// Export every entry, optionally restricted to one mediatype.
pub async fn csv<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Params(params): Params<CsvParams>,
) -> Result<Response, ApiError> {
    let filter = params
        .filter
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty());
    let rows = state.storage.csv_rows(&EntryScope::All, filter)?;
    csv_response(&rows, "medialog_entries.csv")
}

/// A missing or zero `media_id` takes the next free id in the resource.
pub async fn create<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    caller: ApiUser,
    JsonBody(form): JsonBody<EntryForm>,
) -> Result<Response, ApiError> {
    let accession = state
        .storage
        .load_accession(form.accession_id)?
        .ok_or_else(|| {
            ApiError::bad_request(format!("accession {} does not exist", form.accession_id))
        })?;
    let resource = resources::find(&state.storage, accession.resource_id)?;

    let mut entry = Entry::new(
        form,
        &accession,
        resource.repository_id,
        caller.user.id,
        Utc::now(),
    );
    if entry.media_id == 0 {
        entry.media_id = state.storage.next_media_id(resource.id)?;
    } else {
        ensure_unique_media_id(&state.storage, &entry)?;
    }
    entry.validate()?;
    state.storage.insert_entry(&entry)?;
    log::info!(
        "💾 entry {} created (resource {} media id {})",
        entry.id,
        entry.resource_id,
        entry.media_id
    );
    Ok((StatusCode::CREATED, Json(entry)).into_response())
}

pub async fn update<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    caller: ApiUser,
    Path(id): Path<String>,
    JsonBody(form): JsonBody<EntryForm>,
) -> Result<Json<Entry>, ApiError> {
    let mut entry = find(&state.storage, &id)?;
    entry.apply(form, caller.user.id, Utc::now());
    ensure_unique_media_id(&state.storage, &entry)?;
    entry.validate()?;
    state.storage.update_entry(&entry)?;
    Ok(Json(entry))
}

pub async fn delete<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_uuid(&id)?;
    if state.storage.delete_entry(id)? == 0 {
        return Err(ApiError::not_found("entry", id));
    }
    log::info!("🗑️ entry {} deleted", id);
    Ok(Json(MessageResponse::new(format!("entry {id} deleted"))))
}

pub async fn update_location<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    caller: ApiUser,
    Path(id): Path<String>,
    Params(params): Params<LocationParams>,
) -> Result<Json<Entry>, ApiError> {
    let mut entry = find(&state.storage, &id)?;
    let location = params.location.unwrap_or_default();
    if !vocabulary::contains(STORAGE_LOCATIONS, &location) {
        return Err(MedialogError::InvalidLocation(location).into());
    }
    entry.location = location;
    entry.updated_at = Utc::now();
    entry.updated_by = caller.user.id;
    state.storage.update_entry(&entry)?;
    Ok(Json(entry))
}

fn adjacent<S: StorageRead>(storage: &S, raw_id: &str, forward: bool) -> Result<Entry, ApiError> {
    let entry = find(storage, raw_id)?;
    let media_id = if forward {
        entry.media_id.checked_add(1)
    } else {
        entry.media_id.checked_sub(1)
    };
    let neighbour = match media_id {
        Some(media_id) => storage.load_entry_by_media_id(entry.resource_id, media_id)?,
        None => None,
    };
    neighbour.ok_or_else(|| {
        ApiError::NotFound(format!(
            "no {} entry for media id {} in resource {}",
            if forward { "next" } else { "previous" },
            entry.media_id,
            entry.resource_id
        ))
    })
}

pub async fn previous<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Path(id): Path<String>,
) -> Result<Json<Entry>, ApiError> {
    Ok(Json(adjacent(&state.storage, &id, false)?))
}

pub async fn next<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Path(id): Path<String>,
) -> Result<Json<Entry>, ApiError> {
    Ok(Json(adjacent(&state.storage, &id, true)?))
}

/// Copy an entry into the same accession under the next free media id.
pub async fn clone_entry<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    caller: ApiUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let source = find(&state.storage, &id)?;
    let media_id = state.storage.next_media_id(source.resource_id)?;
    let copy = source.duplicate(media_id, caller.user.id, Utc::now());
    state.storage.insert_entry(&copy)?;
    log::info!("💾 entry {} cloned to {}", source.id, copy.id);
    Ok((StatusCode::CREATED, Json(copy)).into_response())
}
