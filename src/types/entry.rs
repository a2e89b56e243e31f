use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Accession, MedialogError};
use crate::vocabulary::{self, MEDIATYPES};

/// A single physical or digital media item logged within an accession.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub created_by: i64,
    pub updated_at: DateTime<Utc>,
    pub updated_by: i64,
    pub media_id: u32,
    pub mediatype: String,
    pub manufacturer: String,
    pub manufacturer_serial: String,
    pub label_text: String,
    pub media_note: String,
    pub hdd_interface: String,
    pub imaging_success: String,
    pub image_filename: String,
    pub interface: String,
    pub imaging_software: String,
    pub interpretation_success: String,
    pub imaged_by: String,
    pub imaging_note: String,
    pub image_format: String,
    pub box_number: String,
    pub original_id: String,
    pub disposition_note: String,
    pub status: String,
    pub stock_unit: String,
    pub stock_size_num: f64,
    pub repository_id: i64,
    pub resource_id: i64,
    pub accession_id: i64,
    pub is_refreshed: bool,
    pub is_transferred: bool,
    pub content_type: String,
    pub structure: String,
    pub location: String,
}

/// Bound request body for creating or updating an entry.
///
/// `media_id` of 0 on create means "next free media id in the resource".
/// `accession_id` is only read on create; entries never move between
/// accessions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryForm {
    pub accession_id: i64,
    pub media_id: u32,
    pub mediatype: String,
    pub manufacturer: String,
    pub manufacturer_serial: String,
    pub label_text: String,
    pub media_note: String,
    pub hdd_interface: String,
    pub imaging_success: String,
    pub image_filename: String,
    pub interface: String,
    pub imaging_software: String,
    pub interpretation_success: String,
    pub imaged_by: String,
    pub imaging_note: String,
    pub image_format: String,
    pub box_number: String,
    pub original_id: String,
    pub disposition_note: String,
    pub status: String,
    pub stock_unit: String,
    pub stock_size_num: f64,
    pub is_refreshed: bool,
    pub is_transferred: bool,
    pub content_type: String,
    pub structure: String,
    pub location: String,
}

impl Entry {
    /// Build a fresh entry for `accession`, inheriting its resource and
    /// the resource's repository.
    pub fn new(
        form: EntryForm,
        accession: &Accession,
        repository_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Self {
        let mut entry = Self {
            id: Uuid::new_v4(),
            created_at: now,
            created_by: user_id,
            updated_at: now,
            updated_by: user_id,
            media_id: form.media_id,
            mediatype: String::new(),
            manufacturer: String::new(),
            manufacturer_serial: String::new(),
            label_text: String::new(),
            media_note: String::new(),
            hdd_interface: String::new(),
            imaging_success: String::new(),
            image_filename: String::new(),
            interface: String::new(),
            imaging_software: String::new(),
            interpretation_success: String::new(),
            imaged_by: String::new(),
            imaging_note: String::new(),
            image_format: String::new(),
            box_number: String::new(),
            original_id: String::new(),
            disposition_note: String::new(),
            status: String::new(),
            stock_unit: String::new(),
            stock_size_num: 0.0,
            repository_id,
            resource_id: accession.resource_id,
            accession_id: accession.id,
            is_refreshed: false,
            is_transferred: false,
            content_type: String::new(),
            structure: String::new(),
            location: String::new(),
        };
        entry.apply(form, user_id, now);
        entry
    }

    /// Overwrite the descriptive fields from `form`. Identity, parent ids
    /// and creation audit columns are left alone.
    pub fn apply(&mut self, form: EntryForm, user_id: i64, now: DateTime<Utc>) {
        if form.media_id > 0 {
            self.media_id = form.media_id;
        }
        self.mediatype = form.mediatype;
        self.manufacturer = form.manufacturer;
        self.manufacturer_serial = form.manufacturer_serial;
        self.label_text = form.label_text;
        self.media_note = form.media_note;
        self.hdd_interface = form.hdd_interface;
        self.imaging_success = form.imaging_success;
        self.image_filename = form.image_filename;
        self.interface = form.interface;
        self.imaging_software = form.imaging_software;
        self.interpretation_success = form.interpretation_success;
        self.imaged_by = form.imaged_by;
        self.imaging_note = form.imaging_note;
        self.image_format = form.image_format;
        self.box_number = form.box_number;
        self.original_id = form.original_id;
        self.disposition_note = form.disposition_note;
        self.status = form.status;
        self.stock_unit = form.stock_unit;
        self.stock_size_num = form.stock_size_num;
        self.is_refreshed = form.is_refreshed;
        self.is_transferred = form.is_transferred;
        self.content_type = form.content_type;
        self.structure = form.structure;
        self.location = form.location;
        self.updated_at = now;
        self.updated_by = user_id;
    }

    /// Copy this entry under a new id and media id, keeping every
    /// descriptive field.
    pub fn duplicate(&self, media_id: u32, user_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            media_id,
            created_at: now,
            created_by: user_id,
            updated_at: now,
            updated_by: user_id,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), MedialogError> {
        if self.mediatype.trim().is_empty() {
            return Err(MedialogError::InvalidMediatype(self.mediatype.clone()));
        }
        if self.media_id < 1 {
            return Err(MedialogError::InvalidMediaId(self.media_id));
        }
        if self.stock_size_num < 1.0 {
            return Err(MedialogError::InvalidStockSize(self.stock_size_num));
        }
        if self.stock_unit.trim().is_empty() {
            return Err(MedialogError::InvalidStockUnit(self.stock_unit.clone()));
        }
        Ok(())
    }
}

/// Upper bound on entries created by one slew request.
pub const MAX_SLEW: u32 = 1000;

/// Bulk-creation request: `num_objects` placeholder entries sharing one
/// mediatype and stock size.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlewForm {
    pub num_objects: u32,
    pub mediatype: String,
    pub media_stock_size: f64,
    pub media_stock_unit: String,
    pub box_num: Option<u32>,
}

impl SlewForm {
    pub fn entry_form(&self, accession_id: i64, media_id: u32) -> EntryForm {
        EntryForm {
            accession_id,
            media_id,
            mediatype: self.mediatype.clone(),
            stock_size_num: self.media_stock_size,
            stock_unit: self.media_stock_unit.clone(),
            box_number: self.box_num.map(|b| b.to_string()).unwrap_or_default(),
            ..Default::default()
        }
    }
}

pub const CSV_HEADER: [&str; 11] = [
    "id",
    "media_id",
    "mediatype",
    "content_type",
    "label_text",
    "is_refreshed",
    "imaging_success",
    "repository",
    "resource",
    "accession",
    "storage_location",
];

/// One export row: an entry joined with the human identifiers of its
/// parents.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryCsvRow {
    pub id: Uuid,
    pub media_id: u32,
    pub mediatype: String,
    pub content_type: String,
    pub label_text: String,
    pub is_refreshed: bool,
    pub imaging_success: String,
    pub repository_slug: String,
    pub collection_code: String,
    pub accession_num: String,
    pub location: String,
}

impl EntryCsvRow {
    /// The mediatype column carries its display label.
    pub fn to_record(&self) -> [String; 11] {
        [
            self.id.to_string(),
            self.media_id.to_string(),
            vocabulary::label(MEDIATYPES, &self.mediatype).to_string(),
            self.content_type.clone(),
            self.label_text.replace(['\r', '\n'], " "),
            if self.is_refreshed { "TRUE" } else { "FALSE" }.to_string(),
            self.imaging_success.clone(),
            self.repository_slug.clone(),
            self.collection_code.clone(),
            self.accession_num.clone(),
            self.location.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accession() -> Accession {
        Accession {
            id: 7,
            accession_num: "2024.001".to_string(),
            accession_note: String::new(),
            accession_state: String::new(),
            resource_id: 3,
            created_at: Utc::now(),
            created_by: 1,
            updated_at: Utc::now(),
            updated_by: 1,
        }
    }

    fn valid_form() -> EntryForm {
        EntryForm {
            accession_id: 7,
            media_id: 4,
            mediatype: "mediatype_cdr".to_string(),
            stock_unit: "MB".to_string(),
            stock_size_num: 700.0,
            ..Default::default()
        }
    }

    #[test]
    fn new_entry_inherits_parents_from_accession() {
        let entry = Entry::new(valid_form(), &accession(), 11, 5, Utc::now());
        assert_eq!(entry.accession_id, 7);
        assert_eq!(entry.resource_id, 3);
        assert_eq!(entry.repository_id, 11);
        assert_eq!(entry.created_by, 5);
        assert_eq!(entry.media_id, 4);
        assert!(entry.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let mut entry = Entry::new(valid_form(), &accession(), 11, 5, Utc::now());
        entry.mediatype.clear();
        assert_eq!(
            entry.validate(),
            Err(MedialogError::InvalidMediatype(String::new()))
        );

        let mut entry = Entry::new(valid_form(), &accession(), 11, 5, Utc::now());
        entry.stock_size_num = 0.5;
        assert!(matches!(
            entry.validate(),
            Err(MedialogError::InvalidStockSize(_))
        ));

        let mut entry = Entry::new(valid_form(), &accession(), 11, 5, Utc::now());
        entry.media_id = 0;
        assert_eq!(entry.validate(), Err(MedialogError::InvalidMediaId(0)));

        let mut entry = Entry::new(valid_form(), &accession(), 11, 5, Utc::now());
        entry.stock_unit = " ".to_string();
        assert!(matches!(
            entry.validate(),
            Err(MedialogError::InvalidStockUnit(_))
        ));
    }

    #[test]
    fn apply_keeps_media_id_when_form_leaves_it_unset() {
        let mut entry = Entry::new(valid_form(), &accession(), 11, 5, Utc::now());
        let form = EntryForm {
            media_id: 0,
            mediatype: "mediatype_dvdr".to_string(),
            ..valid_form()
        };
        entry.apply(form, 9, Utc::now());
        assert_eq!(entry.media_id, 4);
        assert_eq!(entry.mediatype, "mediatype_dvdr");
        assert_eq!(entry.updated_by, 9);
        assert_eq!(entry.created_by, 5);
    }

    #[test]
    fn duplicate_gets_fresh_identity() {
        let entry = Entry::new(valid_form(), &accession(), 11, 5, Utc::now());
        let copy = entry.duplicate(5, 6, Utc::now());
        assert_ne!(copy.id, entry.id);
        assert_eq!(copy.media_id, 5);
        assert_eq!(copy.mediatype, entry.mediatype);
        assert_eq!(copy.accession_id, entry.accession_id);
    }

    #[test]
    fn slew_form_fills_shared_fields() {
        let slew = SlewForm {
            num_objects: 3,
            mediatype: "mediatype_floppy_3_5".to_string(),
            media_stock_size: 1.44,
            media_stock_unit: "MB".to_string(),
            box_num: Some(2),
        };
        let form = slew.entry_form(7, 12);
        assert_eq!(form.media_id, 12);
        assert_eq!(form.accession_id, 7);
        assert_eq!(form.box_number, "2");
        assert_eq!(form.stock_unit, "MB");
    }

    #[test]
    fn csv_record_flattens_label_text() {
        let row = EntryCsvRow {
            id: Uuid::nil(),
            media_id: 1,
            mediatype: "mediatype_zip".to_string(),
            content_type: String::new(),
            label_text: "line one\nline two".to_string(),
            is_refreshed: true,
            imaging_success: "Yes".to_string(),
            repository_slug: "fales".to_string(),
            collection_code: "MSS.001".to_string(),
            accession_num: "2024.001".to_string(),
            location: "sl_cooper".to_string(),
        };
        let record = row.to_record();
        assert_eq!(record[2], "Zip Disk");
        assert_eq!(record[4], "line one line two");
        assert_eq!(record[5], "TRUE");
        assert_eq!(record[7], "fales");
    }

    #[test]
    fn csv_record_marks_unknown_mediatype() {
        let row = EntryCsvRow {
            id: Uuid::nil(),
            media_id: 2,
            mediatype: "mediatype_wax_cylinder".to_string(),
            content_type: String::new(),
            label_text: String::new(),
            is_refreshed: false,
            imaging_success: String::new(),
            repository_slug: "fales".to_string(),
            collection_code: "MSS.001".to_string(),
            accession_num: "2024.001".to_string(),
            location: String::new(),
        };
        assert_eq!(row.to_record()[2], vocabulary::NO_MATCH);
    }
}
