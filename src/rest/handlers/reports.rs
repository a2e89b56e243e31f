use axum::{extract::State, response::Response, Json};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    pagination::parse_bool,
    storage::{EntryScope, Storage, StorageRead},
    summary::{date_from_parts, parse_compact_date, summarize, ReportFilter},
    types::MedialogError,
};

use super::{csv_response, repositories};
use crate::rest::{
    error::ApiError,
    extract::{ApiUser, FormBody, Params, SessionUser},
    models::ReportResponse,
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub repository_id: Option<String>,
    pub is_refreshed: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RangeForm {
    pub start_year: Option<String>,
    pub start_month: Option<String>,
    pub start_day: Option<String>,
    pub end_year: Option<String>,
    pub end_month: Option<String>,
    pub end_day: Option<String>,
    pub repository_id: Option<String>,
    pub is_refreshed: Option<String>,
}

fn required<'a>(field: &'static str, raw: &'a Option<String>) -> Result<&'a str, MedialogError> {
    match raw.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(MedialogError::MissingField(field)),
    }
}

fn number<T: std::str::FromStr>(field: &'static str, raw: &Option<String>) -> Result<T, MedialogError> {
    let raw = required(field, raw)?;
    raw.parse()
        .map_err(|_| MedialogError::InvalidNumber(field, raw.to_string()))
}

/// Absent, empty or `0` selects every repository.
fn repository_filter(raw: &Option<String>) -> Result<Option<i64>, MedialogError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => {
            let id: i64 = v
                .parse()
                .map_err(|_| MedialogError::InvalidNumber("repository_id", v.to_string()))?;
            Ok((id != 0).then_some(id))
        }
    }
}

fn refreshed_flag(raw: &Option<String>) -> Result<bool, MedialogError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some(v) => parse_bool("is_refreshed", v),
    }
}

impl SummaryParams {
    fn filter(&self) -> Result<ReportFilter, MedialogError> {
        let start = parse_compact_date("start_date", required("start_date", &self.start_date)?)?;
        let end = parse_compact_date("end_date", required("end_date", &self.end_date)?)?;
        ReportFilter::new(
            start,
            end,
            repository_filter(&self.repository_id)?,
            refreshed_flag(&self.is_refreshed)?,
        )
    }
}

impl RangeForm {
    fn date(
        field: &'static str,
        year: &Option<String>,
        month: &Option<String>,
        day: &Option<String>,
    ) -> Result<NaiveDate, MedialogError> {
        date_from_parts(
            field,
            number(field, year)?,
            number(field, month)?,
            number(field, day)?,
        )
    }

    fn filter(&self) -> Result<ReportFilter, MedialogError> {
        let start = Self::date(
            "start_date",
            &self.start_year,
            &self.start_month,
            &self.start_day,
        )?;
        let end = Self::date("end_date", &self.end_year, &self.end_month, &self.end_day)?;
        ReportFilter::new(
            start,
            end,
            repository_filter(&self.repository_id)?,
            refreshed_flag(&self.is_refreshed)?,
        )
    }
}

fn report<S: StorageRead>(storage: &S, filter: ReportFilter) -> Result<ReportResponse, ApiError> {
    let repository = match filter.repository_id {
        Some(id) => repositories::find(storage, id)?.slug,
        None => "all".to_string(),
    };
    let entries = storage.scope_entries(&EntryScope::Created(filter.clone()))?;
    let summaries = summarize(&entries);
    Ok(ReportResponse {
        start: filter.start,
        end: filter.end,
        repository_id: filter.repository_id.unwrap_or(0),
        repository,
        is_refreshed: filter.refreshed_only,
        totals: summaries.totals(),
        summaries: summaries.to_vec(),
    })
}

pub async fn summary<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _caller: ApiUser,
    Params(params): Params<SummaryParams>,
) -> Result<Json<ReportResponse>, ApiError> {
    Ok(Json(report(&state.storage, params.filter()?)?))
}

pub async fn range<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _session: SessionUser,
    FormBody(form): FormBody<RangeForm>,
) -> Result<Json<ReportResponse>, ApiError> {
    Ok(Json(report(&state.storage, form.filter()?)?))
}

pub async fn csv<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    _session: SessionUser,
    FormBody(form): FormBody<RangeForm>,
) -> Result<Response, ApiError> {
    let filter = form.filter()?;
    if let Some(id) = filter.repository_id {
        repositories::find(&state.storage, id)?;
    }
    let rows = state.storage.csv_rows(&EntryScope::Created(filter), None)?;
    csv_response(&rows, "report.csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn summary_params_build_a_whole_day_window() {
        let params = SummaryParams {
            start_date: some("20240101"),
            end_date: some("20240131"),
            repository_id: some("0"),
            is_refreshed: some("true"),
        };
        let filter = params.filter().unwrap();
        assert_eq!(filter.start.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(filter.end.format("%H:%M:%S").to_string(), "23:59:59");
        assert_eq!(filter.repository_id, None);
        assert!(filter.refreshed_only);
    }

    #[test]
    fn summary_params_reject_bad_dates() {
        let mut params = SummaryParams {
            start_date: some("2024-01-01"),
            end_date: some("20240131"),
            ..Default::default()
        };
        assert!(matches!(
            params.filter(),
            Err(MedialogError::InvalidDate { field: "start_date", .. })
        ));
        params.start_date = some("20240201");
        assert!(matches!(
            params.filter(),
            Err(MedialogError::InvertedDateRange(_, _))
        ));
        params.end_date = None;
        assert!(matches!(
            params.filter(),
            Err(MedialogError::MissingField("end_date"))
        ));
    }

    #[test]
    fn range_form_parses_parts() {
        let form = RangeForm {
            start_year: some("2023"),
            start_month: some("2"),
            start_day: some("28"),
            end_year: some("2023"),
            end_month: some("3"),
            end_day: some("1"),
            repository_id: some("7"),
            is_refreshed: None,
        };
        let filter = form.filter().unwrap();
        assert_eq!(filter.repository_id, Some(7));
        assert!(!filter.refreshed_only);

        let bad = RangeForm {
            start_day: some("30"),
            ..form
        };
        assert!(matches!(
            bad.filter(),
            Err(MedialogError::InvalidDate { .. })
        ));
    }

    #[test]
    fn range_form_rejects_non_numeric_parts() {
        let form = RangeForm {
            start_year: some("twenty"),
            ..Default::default()
        };
        assert!(matches!(
            form.filter(),
            Err(MedialogError::InvalidNumber("start_date", _))
        ));
    }
}
