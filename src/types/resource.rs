use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An archival collection grouping accessions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: i64,
    pub title: String,
    pub collection_code: String,
    pub partner_code: String,
    pub repository_id: i64,
    pub created_at: DateTime<Utc>,
    pub created_by: i64,
    pub updated_at: DateTime<Utc>,
    pub updated_by: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub collection_code: String,
    #[serde(default)]
    pub partner_code: String,
    pub repository_id: i64,
}

impl Resource {
    pub fn new(form: ResourceForm, user_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            title: form.title,
            collection_code: form.collection_code,
            partner_code: form.partner_code,
            repository_id: form.repository_id,
            created_at: now,
            created_by: user_id,
            updated_at: now,
            updated_by: user_id,
        }
    }

    pub fn apply(&mut self, form: ResourceForm, user_id: i64, now: DateTime<Utc>) {
        self.title = form.title;
        self.collection_code = form.collection_code;
        self.partner_code = form.partner_code;
        self.repository_id = form.repository_id;
        self.updated_at = now;
        self.updated_by = user_id;
    }
}
