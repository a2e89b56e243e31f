use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A batch of material received into a resource at one time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Accession {
    pub id: i64,
    pub accession_num: String,
    pub accession_note: String,
    pub accession_state: String,
    pub resource_id: i64,
    pub created_at: DateTime<Utc>,
    pub created_by: i64,
    pub updated_at: DateTime<Utc>,
    pub updated_by: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessionForm {
    #[serde(default)]
    pub accession_num: String,
    #[serde(default)]
    pub accession_note: String,
    #[serde(default)]
    pub accession_state: String,
    pub resource_id: i64,
}

impl Accession {
    pub fn new(form: AccessionForm, user_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            accession_num: form.accession_num,
            accession_note: form.accession_note,
            accession_state: form.accession_state,
            resource_id: form.resource_id,
            created_at: now,
            created_by: user_id,
            updated_at: now,
            updated_by: user_id,
        }
    }

    pub fn apply(&mut self, form: AccessionForm, user_id: i64, now: DateTime<Utc>) {
        self.accession_num = form.accession_num;
        self.accession_note = form.accession_note;
        self.accession_state = form.accession_state;
        self.resource_id = form.resource_id;
        self.updated_at = now;
        self.updated_by = user_id;
    }
}
