//! Fixed lookup tables for entry attributes.
//!
//! Keys are what gets stored on an entry; values are the display labels.

use serde::Serialize;

pub const NO_MATCH: &str = "No Match";

pub type Vocabulary = &'static [(&'static str, &'static str)];

pub const MEDIATYPES: Vocabulary = &[
    ("mediatype_transfer", "Network Transfer"),
    ("mediatype_floppy_3_5", "3.5 in. Floppy Disk"),
    ("mediatype_floppy_5_25", "5.25 in. Floppy Disk"),
    ("mediatype_floppy_8", "8 in. Floppy Disk"),
    ("mediatype_hard_disk_drive", "Hard Disk Drive"),
    ("mediatype_flash_drive", "Flash Drive"),
    ("mediatype_dvd", "DVD commercial"),
    ("mediatype_dvdr", "DVD-R"),
    ("mediatype_dvdrw", "DVD-RW"),
    ("mediatype_cd", "CD commercial"),
    ("mediatype_cdr", "CD-R"),
    ("mediatype_cdrw", "CD-RW"),
    ("mediatype_cdda", "Audio CD"),
    ("mediatype_jaz", "Jaz Drive"),
    ("mediatype_zip", "Zip Disk"),
    ("mediatype_sd", "SD Card"),
    ("mediatype_minidisc", "MiniDisc"),
    ("mediatype_data_cartridge", "Data Cartridge"),
    ("mediatype_laserdisc", "Laserdisc"),
    ("mediatype_orb", "Orb Disk"),
];

pub const STOCK_UNITS: Vocabulary = &[
    ("KB", "Kilobytes"),
    ("MB", "Megabytes"),
    ("GB", "Gigabytes"),
    ("TB", "Terabytes"),
];

pub const STORAGE_LOCATIONS: Vocabulary = &[
    ("sl_rsw_acm_born_digital", "RW ACM Born Digital"),
    ("sl_rsw_spec_coll", "RW Special Collections"),
    ("sl_rsw_amatica_staging", "RW Archivematica Staging"),
    ("sl_rStar", "R*"),
    ("sl_cooper", "806 Cooper FTK Workstation"),
    ("sl_bobst", "806 Bobst FTK Workstation"),
    ("sl_fred", "ACM FRED FTK Workstation"),
    ("sl_wilma", "ACM WILMA FTK Workstation"),
    ("sl_mac", "ACM Mac Workstation"),
    ("sl_not_imaged", "Not Imaged"),
    ("sl_unknown", "unknown"),
];

pub const ENTRY_STATUSES: Vocabulary = &[
    ("es_to_be_processed", "To Be Processed"),
    ("es_processed", "Processed"),
    ("es_deaccessioned", "Deaccessioned"),
];

pub const INTERFACES: Vocabulary = &[
    ("interface_tableau_ultrabay", "Tableau Ultrabay"),
    ("interface_kryoflux", "KryoFlux"),
    ("interface_tableau_t8r2", "Tableau T8-R2"),
    ("interface_optical_HP", "HP CD/DVD Drive"),
];

pub const HDD_INTERFACES: Vocabulary = &[
    ("hdd_interface_usb", "USB"),
    ("hdd_interface_sata", "SATA"),
    ("hdd_interface_fw400", "FW400"),
    ("hdd_interface_fw800", "FW800"),
    ("hdd_interface_scsi", "SCSI"),
    ("hdd_interface_ide", "IDE"),
];

pub const IMAGING_SOFTWARE: Vocabulary = &[
    ("imaging_software_kryoflux_imager_v220", "KryoFlux Imager (DTC 2.20)"),
    ("imaging_software_kryoflux_imager_v30", "KryoFlux Imager (DTC 3.0)"),
    ("imaging_software_ftk_imager_v3146", "FTK Imager (v3.1.4.6)"),
    ("imaging_software_ftk_imager_v42013", "FTK Imager (v4.2.0.13)"),
    ("imaging_software_isobusterpro_v43", "IsoBuster Pro (v4.3)"),
    ("imaging_software_eac_v13", "Exact Audio Copy (v1.3)"),
];

pub const IMAGE_FORMATS: Vocabulary = &[
    ("image_format_raw", "Raw (dd)"),
    ("image_format_e01", "E01"),
    ("image_format_ad1", "AD1"),
    ("image_format_iso", "ISO - Userspace"),
    ("image_format_iso_raw", "ISO - Raw"),
    ("image_format_bincue", "BIN/CUE"),
    ("image_format_wavcue", "WAV/CUE"),
];

pub const IMAGING_SUCCESS: Vocabulary = &[
    ("image_success_yes", "Yes"),
    ("image_success_no", "No"),
];

pub const INTERPRETATION_SUCCESS: Vocabulary = &[
    ("interpret_success_yes", "Yes"),
    ("interpret_success_yes_errors", "Yes W/Errors"),
    ("interpret_success_no", "No"),
];

/// Label for `key` in `vocabulary`, or [`NO_MATCH`].
pub fn label(vocabulary: Vocabulary, key: &str) -> &'static str {
    vocabulary
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .unwrap_or(NO_MATCH)
}

pub fn contains(vocabulary: Vocabulary, key: &str) -> bool {
    vocabulary.iter().any(|(k, _)| *k == key)
}

#[derive(Serialize)]
pub struct Vocabularies {
    pub mediatypes: Vec<Term>,
    pub stock_units: Vec<Term>,
    pub storage_locations: Vec<Term>,
    pub entry_statuses: Vec<Term>,
    pub interfaces: Vec<Term>,
    pub hdd_interfaces: Vec<Term>,
    pub imaging_software: Vec<Term>,
    pub image_formats: Vec<Term>,
    pub imaging_success: Vec<Term>,
    pub interpretation_success: Vec<Term>,
}

#[derive(Serialize)]
pub struct Term {
    pub key: &'static str,
    pub label: &'static str,
}

fn terms(vocabulary: Vocabulary) -> Vec<Term> {
    vocabulary
        .iter()
        .map(|(key, label)| Term { key, label })
        .collect()
}

pub fn all() -> Vocabularies {
    Vocabularies {
        mediatypes: terms(MEDIATYPES),
        stock_units: terms(STOCK_UNITS),
        storage_locations: terms(STORAGE_LOCATIONS),
        entry_statuses: terms(ENTRY_STATUSES),
        interfaces: terms(INTERFACES),
        hdd_interfaces: terms(HDD_INTERFACES),
        imaging_software: terms(IMAGING_SOFTWARE),
        image_formats: terms(IMAGE_FORMATS),
        imaging_success: terms(IMAGING_SUCCESS),
        interpretation_success: terms(INTERPRETATION_SUCCESS),
    }
}
