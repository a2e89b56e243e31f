use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level archival institution or division owning resources.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub created_by: i64,
    pub updated_at: DateTime<Utc>,
    pub updated_by: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryForm {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
}

impl Repository {
    pub fn new(form: RepositoryForm, user_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            slug: form.slug,
            title: form.title,
            created_at: now,
            created_by: user_id,
            updated_at: now,
            updated_by: user_id,
        }
    }

    pub fn apply(&mut self, form: RepositoryForm, user_id: i64, now: DateTime<Utc>) {
        self.slug = form.slug;
        self.title = form.title;
        self.updated_at = now;
        self.updated_by = user_id;
    }
}
