//! Offset/limit pagination over entry listings.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::MedialogError;

pub const DEFAULT_PAGE_SIZE: u32 = 25;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    MediaId,
    Mediatype,
    CreatedAt,
    UpdatedAt,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sort {
    pub key: SortKey,
    pub descending: bool,
}

impl Sort {
    /// Column list for an `ORDER BY` clause. Ties are broken by id so pages
    /// are deterministic.
    pub fn order_by(&self) -> &'static str {
        match (self.key, self.descending) {
            (SortKey::MediaId, false) => "media_id ASC, id ASC",
            (SortKey::MediaId, true) => "media_id DESC, id ASC",
            (SortKey::Mediatype, false) => "mediatype ASC, media_id ASC, id ASC",
            (SortKey::Mediatype, true) => "mediatype DESC, media_id ASC, id ASC",
            (SortKey::CreatedAt, false) => "created_at ASC, id ASC",
            (SortKey::CreatedAt, true) => "created_at DESC, id ASC",
            (SortKey::UpdatedAt, false) => "updated_at ASC, id ASC",
            (SortKey::UpdatedAt, true) => "updated_at DESC, id ASC",
        }
    }
}

impl FromStr for Sort {
    type Err = MedialogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let key = match parts.next() {
            Some("media_id") | None => SortKey::MediaId,
            Some("mediatype") => SortKey::Mediatype,
            Some("created_at") => SortKey::CreatedAt,
            Some("updated_at") => SortKey::UpdatedAt,
            Some(_) => return Err(MedialogError::InvalidSort(s.to_string())),
        };
        let descending = match parts.next().map(|d| d.to_ascii_lowercase()) {
            None => false,
            Some(d) if d == "asc" => false,
            Some(d) if d == "desc" => true,
            Some(_) => return Err(MedialogError::InvalidSort(s.to_string())),
        };
        if parts.next().is_some() {
            return Err(MedialogError::InvalidSort(s.to_string()));
        }
        Ok(Sort { key, descending })
    }
}

/// Raw query-string parameters of a listing request.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub all_ids: Option<String>,
    pub filter: Option<String>,
    pub sort: Option<String>,
}

impl PageParams {
    pub fn all_ids(&self) -> Result<bool, MedialogError> {
        match self.all_ids.as_deref().map(str::trim) {
            None | Some("") => Ok(false),
            Some(v) => parse_bool("all_ids", v),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    /// Restrict to one mediatype.
    pub filter: Option<String>,
    pub sort: Sort,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            filter: None,
            sort: Sort::default(),
        }
    }
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            ..Default::default()
        }
    }

    pub fn from_params(params: &PageParams) -> Result<Self, MedialogError> {
        let page = parse_positive("page", params.page.as_deref())?.unwrap_or(1);
        let page_size = parse_positive("page_size", params.page_size.as_deref())?
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let sort = match params.sort.as_deref().map(str::trim) {
            None | Some("") => Sort::default(),
            Some(s) => s.parse()?,
        };
        let filter = params
            .filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string);
        Ok(Self {
            filter,
            sort,
            ..Self::new(page, page_size)
        })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page_size) * u64::from(self.page.saturating_sub(1))
    }

    pub fn limit(&self) -> u32 {
        self.page_size
    }
}

pub fn total_pages(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(u64::from(page_size))
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultSet<T> {
    pub first_page: u64,
    pub last_page: u64,
    pub this_page: u64,
    pub total: u64,
    pub results: Vec<T>,
}

impl<T> ResultSet<T> {
    pub fn new(results: Vec<T>, total: u64, pagination: &Pagination) -> Self {
        Self {
            first_page: 1,
            last_page: total_pages(total, pagination.page_size),
            this_page: u64::from(pagination.page),
            total,
            results,
        }
    }
}

fn parse_positive(field: &'static str, raw: Option<&str>) -> Result<Option<u32>, MedialogError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };
    let value: i64 = raw
        .parse()
        .map_err(|_| MedialogError::InvalidNumber(field, raw.to_string()))?;
    if value < 1 {
        return Err(MedialogError::InvalidPageParam(field, value));
    }
    Ok(Some(u32::try_from(value).unwrap_or(u32::MAX)))
}

pub fn parse_bool(field: &'static str, raw: &str) -> Result<bool, MedialogError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "t" | "yes" | "on" => Ok(true),
        "false" | "0" | "f" | "no" | "off" => Ok(false),
        _ => Err(MedialogError::InvalidBool(field, raw.to_string())),
    }
}
