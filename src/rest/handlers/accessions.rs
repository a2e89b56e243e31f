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
    types::{Accession, AccessionForm, Entry, MedialogError, SlewForm, MAX_SLEW},
};

use super::{csv_response, entries_page, parse_id, repositories, resources, scope_summary};
use crate::rest::{
    error::ApiError,
    extract::{ApiUser, JsonBody, Params},
    models::{MessageResponse, SummaryResponse},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub resource_id: Option<String>,
}

pub(crate) fn find<S: StorageRead>(storage: &S, id: i64) -> Result<Accession, ApiError> {
    storage
        .load_accession(id)?
        .ok_or_else(|| ApiError::not_found("accession", id))
}

fn validate<S: StorageRead>(storage: &S, form: &AccessionForm) -> Result<(), ApiError> {
    if form.accession_num.trim().is_empty() {
        return Err(MedialogError::MissingField("accession_num").into());
    }
    if storage.load_resource(form.resource_id)?.is_none() {
        return Err(ApiError::bad_request(format!(
            "resource {} does not exist",
            form.resource_id
        )));
    }
    Ok(())
}

pub async fn list<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Params(params): Params<ListParams>,
) -> Result<Json<Vec<Accession>>, ApiError> {
    let resource_id = match params.resource_id.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Some(parse_id(raw)?),
        _ => None,
    };
    Ok(Json(state.storage.list_accessions(resource_id)?))
}

pub async fn show<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Path(id): Path<String>,
) -> Result<Json<Accession>, ApiError> {
    Ok(Json(find(&state.storage, parse_id(&id)?)?))
}

pub async fn create<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    caller: ApiUser,
    JsonBody(form): JsonBody<AccessionForm>,
) -> Result<Response, ApiError> {
    validate(&state.storage, &form)?;
    let mut accession = Accession::new(form, caller.user.id, Utc::now());
    accession.id = state.storage.insert_accession(&accession)?;
    log::info!(
        "📁 accession {} created ({})",
        accession.id,
        accession.accession_num
    );
    Ok((StatusCode::CREATED, Json(accession)).into_response())
}

pub async fn update<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    caller: ApiUser,
    Path(id): Path<String>,
    JsonBody(form): JsonBody<AccessionForm>,
) -> Result<Json<Accession>, ApiError> {
    let mut accession = find(&state.storage, parse_id(&id)?)?;
    validate(&state.storage, &form)?;
    accession.apply(form, caller.user.id, Utc::now());
    let resource = resources::find(&state.storage, accession.resource_id)?;
    let tx = state.storage.begin_tx()?;
    tx.update_accession(&accession)?;
    let moved =
        tx.reassign_accession_entries(accession.id, resource.id, resource.repository_id)?;
    tx.commit()?;
    log::debug!(
        "📦 accession {} updated, {} entries under resource {}",
        accession.id,
        moved,
        resource.id
    );
    Ok(Json(accession))
}

pub async fn delete<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    if state.storage.delete_accession(id)? == 0 {
        return Err(ApiError::not_found("accession", id));
    }
    log::info!("🗑️ accession {} deleted", id);
    Ok(Json(MessageResponse::new(format!("accession {id} deleted"))))
}

pub async fn entries<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Path(id): Path<String>,
    Params(params): Params<PageParams>,
) -> Result<Response, ApiError> {
    let accession = find(&state.storage, parse_id(&id)?)?;
    entries_page(&state.storage, EntryScope::Accession(accession.id), &params)
}

pub async fn summary<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Path(id): Path<String>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let accession = find(&state.storage, parse_id(&id)?)?;
    Ok(Json(scope_summary(
        &state.storage,
        &EntryScope::Accession(accession.id),
    )?))
}

pub async fn csv<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let accession = find(&state.storage, parse_id(&id)?)?;
    let resource = resources::find(&state.storage, accession.resource_id)?;
    let repository = repositories::find(&state.storage, resource.repository_id)?;
    let rows = state.storage.csv_rows(&EntryScope::Accession(accession.id), None)?;
    let filename = format!(
        "{}_{}_{}.csv",
        repository.slug, resource.collection_code, accession.accession_num
    );
    csv_response(&rows, &filename)
}

/// Create `num_objects` entries with consecutive media ids, all or none.
pub async fn slew<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    caller: ApiUser,
    Path(id): Path<String>,
    JsonBody(form): JsonBody<SlewForm>,
) -> Result<Response, ApiError> {
    let accession = find(&state.storage, parse_id(&id)?)?;
    if !(1..=MAX_SLEW).contains(&form.num_objects) {
        return Err(MedialogError::InvalidSlewCount(form.num_objects).into());
    }
    let resource = resources::find(&state.storage, accession.resource_id)?;
    let now = Utc::now();
    let build = |media_id: u32| {
        Entry::new(
            form.entry_form(accession.id, media_id),
            &accession,
            resource.repository_id,
            caller.user.id,
            now,
        )
    };
    build(1).validate()?;

    let tx = state.storage.begin_tx()?;
    let first = tx.next_media_id(resource.id)?;
    let mut created = Vec::new();
    for offset in 0..form.num_objects {
        let entry = build(first.saturating_add(offset));
        entry.validate()?;
        tx.insert_entry(&entry)?;
        created.push(entry);
    }
    tx.commit()?;

    log::info!(
        "📦 slewed {} entries into accession {} (media ids {}..={})",
        created.len(),
        accession.id,
        first,
        first.saturating_add(form.num_objects - 1)
    );
    Ok((StatusCode::CREATED, Json(created)).into_response())
}
