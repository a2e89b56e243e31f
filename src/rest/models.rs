use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::RecordCounts;
use crate::summary::{Summaries, Summary, Totals};
use crate::types::{Entry, User};

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
    pub api_version: String,
    pub uptime_secs: u64,
}

#[derive(Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summaries: Vec<Summary>,
    pub totals: Totals,
}

impl From<Summaries> for SummaryResponse {
    fn from(summaries: Summaries) -> Self {
        Self {
            totals: summaries.totals(),
            summaries: summaries.to_vec(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ReportResponse {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// 0 when the report spans every repository.
    pub repository_id: i64,
    /// Repository slug, or `all`.
    pub repository: String,
    pub is_refreshed: bool,
    pub summaries: Vec<Summary>,
    pub totals: Totals,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub user: User,
    pub counts: RecordCounts,
    pub recent_entries: Vec<Entry>,
}

#[derive(Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: i64,
    pub email: String,
    pub is_admin: bool,
    pub can_access_api: bool,
    pub expires: DateTime<Utc>,
}
