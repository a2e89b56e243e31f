use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MedialogError {
    #[error("mediatype: `{0}` is not valid")]
    InvalidMediatype(String),
    #[error("mediaID: `{0}` is not valid")]
    InvalidMediaId(u32),
    #[error("stock size number: `{0}` is not valid")]
    InvalidStockSize(f64),
    #[error("stock unit: `{0}` is not valid")]
    InvalidStockUnit(String),
    #[error("media id {media_id} already exists in resource {resource_id}")]
    DuplicateMediaId { media_id: u32, resource_id: i64 },
    #[error("`{0}` is not a valid location")]
    InvalidLocation(String),
    #[error("invalid {field}: `{value}`")]
    InvalidDate { field: &'static str, value: String },
    #[error("start date {0} is after end date {1}")]
    InvertedDateRange(String, String),
    #[error("invalid sort key: `{0}`")]
    InvalidSort(String),
    #[error("{0} must be at least 1, got {1}")]
    InvalidPageParam(&'static str, i64),
    #[error("{0}: `{1}` is not a number")]
    InvalidNumber(&'static str, String),
    #[error("{0}: `{1}` is not a boolean")]
    InvalidBool(&'static str, String),
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("slew must create between 1 and 1000 entries, got {0}")]
    InvalidSlewCount(u32),
}
