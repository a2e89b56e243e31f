use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::{
    pagination::{PageParams, Pagination, ResultSet},
    storage::{EntryScope, Storage, StorageRead},
    summary::summarize,
    types::{EntryCsvRow, CSV_HEADER},
    vocabulary,
};

use super::{
    error::ApiError,
    extract::ApiUser,
    models::{ErrorResponse, InfoResponse, SummaryResponse},
    AppState,
};

pub mod accessions;
pub mod entries;
pub mod reports;
pub mod repositories;
pub mod resources;
pub mod session;
pub mod users;

pub const API_VERSION: &str = "v0";

pub async fn info<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    Json(InfoResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_version: API_VERSION.to_string(),
        uptime_secs,
    })
}

pub async fn vocabularies(_caller: ApiUser) -> impl IntoResponse {
    Json(vocabulary::all())
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            message: "endpoint not found".to_string(),
        }),
    )
}

pub(crate) fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("invalid id: `{raw}`")))
}

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("invalid id: `{raw}`")))
}

/// A page of entries in `scope`, or just their ids when `all_ids` is set.
pub(crate) fn entries_page<S: StorageRead>(
    storage: &S,
    scope: EntryScope,
    params: &PageParams,
) -> Result<Response, ApiError> {
    if params.all_ids()? {
        let ids = storage.list_entry_ids(&scope)?;
        return Ok(Json(ids).into_response());
    }
    let pagination = Pagination::from_params(params)?;
    let total = storage.count_entries(&scope, pagination.filter.as_deref())?;
    let results = storage.list_entries(&scope, &pagination)?;
    Ok(Json(ResultSet::new(results, total, &pagination)).into_response())
}

pub(crate) fn scope_summary<S: StorageRead>(
    storage: &S,
    scope: &EntryScope,
) -> Result<SummaryResponse, ApiError> {
    let entries = storage.scope_entries(scope)?;
    Ok(summarize(&entries).into())
}

pub(crate) fn csv_response(rows: &[EntryCsvRow], filename: &str) -> Result<Response, ApiError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.write_record(row.to_record())?;
    }
    let body = writer
        .into_inner()
        .map_err(|err| ApiError::Internal(anyhow::anyhow!("flush csv: {}", err)))?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}
