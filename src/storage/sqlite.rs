use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{
    params, params_from_iter,
    types::{Type, Value},
    Connection, OptionalExtension,
};
use std::{path::Path, str::FromStr};
use uuid::Uuid;

use super::traits::{
    EntryScope, RecordCounts, Storage, StorageRead, StorageTx, StorageWrite,
};
use crate::pagination::Pagination;
use crate::types::{
    Accession, Entry, EntryCsvRow, Repository, Resource, Token, TokenKind, User,
};

const DB_SCHEMA_VERSION: i64 = 1;

#[derive(Clone)]
pub struct SqliteStorage {
    pub path: String,
}

pub struct SqliteTx {
    conn: Connection,
}

/// Anything that can hand out a migrated connection. Both the storage
/// handle and an open transaction implement the storage traits through it.
pub trait WithConn {
    fn with_conn<F, T>(&self, f: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>;
}

fn open(path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(std::time::Duration::from_millis(500))?;
    Ok(conn)
}

fn invalid_data(idx: usize, ty: Type, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        ty,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, msg)),
    )
}

fn millis(at: &DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn get_time(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| invalid_data(idx, Type::Integer, format!("timestamp out of range: {ms}")))
}

fn get_uuid(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn count(conn: &Connection, sql: &str) -> rusqlite::Result<u64> {
    let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(n.max(0) as u64)
}

// Repositories

const REPOSITORY_COLUMNS: &str = "id, slug, title, created_at, created_by, updated_at, updated_by";

fn map_repository_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Repository> {
    Ok(Repository {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        created_at: get_time(row, 3)?,
        created_by: row.get(4)?,
        updated_at: get_time(row, 5)?,
        updated_by: row.get(6)?,
    })
}

fn db_list_repositories(conn: &Connection) -> rusqlite::Result<Vec<Repository>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {REPOSITORY_COLUMNS} FROM repositories ORDER BY id"))?;
    let rows = stmt
        .query_map([], map_repository_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_load_repository(conn: &Connection, id: i64) -> rusqlite::Result<Option<Repository>> {
    conn.query_row(
        &format!("SELECT {REPOSITORY_COLUMNS} FROM repositories WHERE id = ?1"),
        params![id],
        map_repository_row,
    )
    .optional()
}

fn db_insert_repository(conn: &Connection, r: &Repository) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO repositories (slug, title, created_at, created_by, updated_at, updated_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            r.slug,
            r.title,
            millis(&r.created_at),
            r.created_by,
            millis(&r.updated_at),
            r.updated_by
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn db_update_repository(conn: &Connection, r: &Repository) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE repositories SET slug = ?1, title = ?2, updated_at = ?3, updated_by = ?4
         WHERE id = ?5",
        params![r.slug, r.title, millis(&r.updated_at), r.updated_by, r.id],
    )
}

// Resources

const RESOURCE_COLUMNS: &str = "id, title, collection_code, partner_code, repository_id, \
     created_at, created_by, updated_at, updated_by";

fn map_resource_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: row.get(0)?,
        title: row.get(1)?,
        collection_code: row.get(2)?,
        partner_code: row.get(3)?,
        repository_id: row.get(4)?,
        created_at: get_time(row, 5)?,
        created_by: row.get(6)?,
        updated_at: get_time(row, 7)?,
        updated_by: row.get(8)?,
    })
}

fn db_list_resources(
    conn: &Connection,
    repository_id: Option<i64>,
) -> rusqlite::Result<Vec<Resource>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RESOURCE_COLUMNS} FROM resources
         WHERE ?1 IS NULL OR repository_id = ?1
         ORDER BY id"
    ))?;
    let rows = stmt
        .query_map(params![repository_id], map_resource_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_load_resource(conn: &Connection, id: i64) -> rusqlite::Result<Option<Resource>> {
    conn.query_row(
        &format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = ?1"),
        params![id],
        map_resource_row,
    )
    .optional()
}

fn db_insert_resource(conn: &Connection, r: &Resource) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO resources (
            title, collection_code, partner_code, repository_id,
            created_at, created_by, updated_at, updated_by
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            r.title,
            r.collection_code,
            r.partner_code,
            r.repository_id,
            millis(&r.created_at),
            r.created_by,
            millis(&r.updated_at),
            r.updated_by
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn db_update_resource(conn: &Connection, r: &Resource) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE resources SET title = ?1, collection_code = ?2, partner_code = ?3,
            repository_id = ?4, updated_at = ?5, updated_by = ?6
         WHERE id = ?7",
        params![
            r.title,
            r.collection_code,
            r.partner_code,
            r.repository_id,
            millis(&r.updated_at),
            r.updated_by,
            r.id
        ],
    )
}

// Accessions

const ACCESSION_COLUMNS: &str = "id, accession_num, accession_note, accession_state, resource_id, \
     created_at, created_by, updated_at, updated_by";

fn map_accession_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Accession> {
    Ok(Accession {
        id: row.get(0)?,
        accession_num: row.get(1)?,
        accession_note: row.get(2)?,
        accession_state: row.get(3)?,
        resource_id: row.get(4)?,
        created_at: get_time(row, 5)?,
        created_by: row.get(6)?,
        updated_at: get_time(row, 7)?,
        updated_by: row.get(8)?,
    })
}

fn db_list_accessions(
    conn: &Connection,
    resource_id: Option<i64>,
) -> rusqlite::Result<Vec<Accession>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ACCESSION_COLUMNS} FROM accessions
         WHERE ?1 IS NULL OR resource_id = ?1
         ORDER BY id"
    ))?;
    let rows = stmt
        .query_map(params![resource_id], map_accession_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_load_accession(conn: &Connection, id: i64) -> rusqlite::Result<Option<Accession>> {
    conn.query_row(
        &format!("SELECT {ACCESSION_COLUMNS} FROM accessions WHERE id = ?1"),
        params![id],
        map_accession_row,
    )
    .optional()
}

fn db_insert_accession(conn: &Connection, a: &Accession) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO accessions (
            accession_num, accession_note, accession_state, resource_id,
            created_at, created_by, updated_at, updated_by
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            a.accession_num,
            a.accession_note,
            a.accession_state,
            a.resource_id,
            millis(&a.created_at),
            a.created_by,
            millis(&a.updated_at),
            a.updated_by
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn db_update_accession(conn: &Connection, a: &Accession) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE accessions SET accession_num = ?1, accession_note = ?2, accession_state = ?3,
            resource_id = ?4, updated_at = ?5, updated_by = ?6
         WHERE id = ?7",
        params![
            a.accession_num,
            a.accession_note,
            a.accession_state,
            a.resource_id,
            millis(&a.updated_at),
            a.updated_by,
            a.id
        ],
    )
}

fn db_reassign_resource_entries(
    conn: &Connection,
    resource_id: i64,
    repository_id: i64,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE entries SET repository_id = ?1 WHERE resource_id = ?2",
        params![repository_id, resource_id],
    )
}

fn db_reassign_accession_entries(
    conn: &Connection,
    accession_id: i64,
    resource_id: i64,
    repository_id: i64,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE entries SET resource_id = ?1, repository_id = ?2 WHERE accession_id = ?3",
        params![resource_id, repository_id, accession_id],
    )
}

fn db_delete(conn: &Connection, table: &str, id: i64) -> rusqlite::Result<usize> {
    conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id])
}

// Entries

const ENTRY_COLUMNS: &str = "e.id, e.created_at, e.created_by, e.updated_at, e.updated_by, \
     e.media_id, e.mediatype, e.manufacturer, e.manufacturer_serial, e.label_text, e.media_note, \
     e.hdd_interface, e.imaging_success, e.image_filename, e.interface, e.imaging_software, \
     e.interpretation_success, e.imaged_by, e.imaging_note, e.image_format, e.box_number, \
     e.original_id, e.disposition_note, e.status, e.stock_unit, e.stock_size_num, \
     e.repository_id, e.resource_id, e.accession_id, e.is_refreshed, e.is_transferred, \
     e.content_type, e.structure, e.location";

fn map_entry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: get_uuid(row, 0)?,
        created_at: get_time(row, 1)?,
        created_by: row.get(2)?,
        updated_at: get_time(row, 3)?,
        updated_by: row.get(4)?,
        media_id: row.get(5)?,
        mediatype: row.get(6)?,
        manufacturer: row.get(7)?,
        manufacturer_serial: row.get(8)?,
        label_text: row.get(9)?,
        media_note: row.get(10)?,
        hdd_interface: row.get(11)?,
        imaging_success: row.get(12)?,
        image_filename: row.get(13)?,
        interface: row.get(14)?,
        imaging_software: row.get(15)?,
        interpretation_success: row.get(16)?,
        imaged_by: row.get(17)?,
        imaging_note: row.get(18)?,
        image_format: row.get(19)?,
        box_number: row.get(20)?,
        original_id: row.get(21)?,
        disposition_note: row.get(22)?,
        status: row.get(23)?,
        stock_unit: row.get(24)?,
        stock_size_num: row.get(25)?,
        repository_id: row.get(26)?,
        resource_id: row.get(27)?,
        accession_id: row.get(28)?,
        is_refreshed: row.get(29)?,
        is_transferred: row.get(30)?,
        content_type: row.get(31)?,
        structure: row.get(32)?,
        location: row.get(33)?,
    })
}

/// `WHERE` clause and bind values selecting `scope` from `entries e`.
fn scope_filter(scope: &EntryScope, mediatype: Option<&str>) -> (String, Vec<Value>) {
    let mut clauses: Vec<&'static str> = Vec::new();
    let mut values = Vec::new();
    match scope {
        EntryScope::All => {}
        EntryScope::Repository(id) => {
            clauses.push("e.repository_id = ?");
            values.push(Value::Integer(*id));
        }
        EntryScope::Resource(id) => {
            clauses.push("e.resource_id = ?");
            values.push(Value::Integer(*id));
        }
        EntryScope::Accession(id) => {
            clauses.push("e.accession_id = ?");
            values.push(Value::Integer(*id));
        }
        EntryScope::Created(filter) => {
            clauses.push("e.created_at >= ?");
            values.push(Value::Integer(millis(&filter.start)));
            clauses.push("e.created_at <= ?");
            values.push(Value::Integer(millis(&filter.end)));
            if let Some(repository_id) = filter.repository_id {
                clauses.push("e.repository_id = ?");
                values.push(Value::Integer(repository_id));
            }
            if filter.refreshed_only {
                clauses.push("e.is_refreshed = 1");
            }
        }
    }
    if let Some(mediatype) = mediatype {
        clauses.push("e.mediatype = ?");
        values.push(Value::Text(mediatype.to_string()));
    }
    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", clauses.join(" AND ")), values)
    }
}

fn db_load_entry(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Entry>> {
    conn.query_row(
        &format!("SELECT {ENTRY_COLUMNS} FROM entries e WHERE e.id = ?1"),
        params![id.to_string()],
        map_entry_row,
    )
    .optional()
}

fn db_load_entry_by_media_id(
    conn: &Connection,
    resource_id: i64,
    media_id: u32,
) -> rusqlite::Result<Option<Entry>> {
    conn.query_row(
        &format!(
            "SELECT {ENTRY_COLUMNS} FROM entries e WHERE e.resource_id = ?1 AND e.media_id = ?2"
        ),
        params![resource_id, media_id],
        map_entry_row,
    )
    .optional()
}

fn db_list_entries(
    conn: &Connection,
    scope: &EntryScope,
    pagination: &Pagination,
) -> rusqlite::Result<Vec<Entry>> {
    let (filter, mut values) = scope_filter(scope, pagination.filter.as_deref());
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM entries e {filter} ORDER BY {} LIMIT ? OFFSET ?",
        pagination.sort.order_by()
    );
    values.push(Value::Integer(i64::from(pagination.limit())));
    values.push(Value::Integer(
        i64::try_from(pagination.offset()).unwrap_or(i64::MAX),
    ));
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), map_entry_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_count_entries(
    conn: &Connection,
    scope: &EntryScope,
    mediatype: Option<&str>,
) -> rusqlite::Result<u64> {
    let (filter, values) = scope_filter(scope, mediatype);
    let n: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM entries e {filter}"),
        params_from_iter(values.iter()),
        |row| row.get(0),
    )?;
    Ok(n.max(0) as u64)
}

fn db_list_entry_ids(conn: &Connection, scope: &EntryScope) -> rusqlite::Result<Vec<Uuid>> {
    let (filter, values) = scope_filter(scope, None);
    let mut stmt = conn.prepare(&format!(
        "SELECT e.id FROM entries e {filter} ORDER BY e.media_id, e.id"
    ))?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), |row| get_uuid(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_scope_entries(conn: &Connection, scope: &EntryScope) -> rusqlite::Result<Vec<Entry>> {
    let (filter, values) = scope_filter(scope, None);
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM entries e {filter} ORDER BY e.media_id, e.id"
    ))?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), map_entry_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_recent_entries(conn: &Connection, limit: u32) -> rusqlite::Result<Vec<Entry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM entries e ORDER BY e.updated_at DESC, e.id LIMIT ?1"
    ))?;
    let rows = stmt
        .query_map(params![limit], map_entry_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_next_media_id(conn: &Connection, resource_id: i64) -> rusqlite::Result<u32> {
    let max: Option<u32> = conn.query_row(
        "SELECT MAX(media_id) FROM entries WHERE resource_id = ?1",
        params![resource_id],
        |row| row.get(0),
    )?;
    Ok(max.map_or(1, |m| m.saturating_add(1)))
}

fn db_media_id_exists(
    conn: &Connection,
    resource_id: i64,
    media_id: u32,
    except: Option<Uuid>,
) -> rusqlite::Result<bool> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM entries
             WHERE resource_id = ?1 AND media_id = ?2 AND (?3 IS NULL OR id <> ?3)
             LIMIT 1",
            params![resource_id, media_id, except.map(|id| id.to_string())],
            |row| row.get(0),
        )
        .optional()?;
    Ok(existing.is_some())
}

fn map_csv_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryCsvRow> {
    Ok(EntryCsvRow {
        id: get_uuid(row, 0)?,
        media_id: row.get(1)?,
        mediatype: row.get(2)?,
        content_type: row.get(3)?,
        label_text: row.get(4)?,
        is_refreshed: row.get(5)?,
        imaging_success: row.get(6)?,
        repository_slug: row.get(7)?,
        collection_code: row.get(8)?,
        accession_num: row.get(9)?,
        location: row.get(10)?,
    })
}

fn db_csv_rows(
    conn: &Connection,
    scope: &EntryScope,
    mediatype: Option<&str>,
) -> rusqlite::Result<Vec<EntryCsvRow>> {
    let (filter, values) = scope_filter(scope, mediatype);
    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT e.id, e.media_id, e.mediatype, e.content_type, e.label_text, e.is_refreshed,
               e.imaging_success, r.slug, res.collection_code, a.accession_num, e.location
        FROM entries e
        JOIN repositories r ON r.id = e.repository_id
        JOIN resources res ON res.id = e.resource_id
        JOIN accessions a ON a.id = e.accession_id
        {filter}
        ORDER BY e.media_id, e.id
        "#
    ))?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), map_csv_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_record_counts(conn: &Connection) -> rusqlite::Result<RecordCounts> {
    Ok(RecordCounts {
        repositories: count(conn, "SELECT COUNT(*) FROM repositories")?,
        resources: count(conn, "SELECT COUNT(*) FROM resources")?,
        accessions: count(conn, "SELECT COUNT(*) FROM accessions")?,
        entries: count(conn, "SELECT COUNT(*) FROM entries")?,
        users: count(conn, "SELECT COUNT(*) FROM users")?,
    })
}

fn db_insert_entry(conn: &Connection, e: &Entry) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO entries (
            id, created_at, created_by, updated_at, updated_by,
            media_id, mediatype, manufacturer, manufacturer_serial, label_text, media_note,
            hdd_interface, imaging_success, image_filename, interface, imaging_software,
            interpretation_success, imaged_by, imaging_note, image_format, box_number,
            original_id, disposition_note, status, stock_unit, stock_size_num,
            repository_id, resource_id, accession_id, is_refreshed, is_transferred,
            content_type, structure, location
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
            ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32, ?33, ?34
        )
        "#,
        params![
            e.id.to_string(),
            millis(&e.created_at),
            e.created_by,
            millis(&e.updated_at),
            e.updated_by,
            e.media_id,
            e.mediatype,
            e.manufacturer,
            e.manufacturer_serial,
            e.label_text,
            e.media_note,
            e.hdd_interface,
            e.imaging_success,
            e.image_filename,
            e.interface,
            e.imaging_software,
            e.interpretation_success,
            e.imaged_by,
            e.imaging_note,
            e.image_format,
            e.box_number,
            e.original_id,
            e.disposition_note,
            e.status,
            e.stock_unit,
            e.stock_size_num,
            e.repository_id,
            e.resource_id,
            e.accession_id,
            e.is_refreshed,
            e.is_transferred,
            e.content_type,
            e.structure,
            e.location
        ],
    )?;
    Ok(())
}

fn db_update_entry(conn: &Connection, e: &Entry) -> rusqlite::Result<usize> {
    conn.execute(
        r#"
        UPDATE entries SET
            updated_at = ?2, updated_by = ?3, media_id = ?4, mediatype = ?5,
            manufacturer = ?6, manufacturer_serial = ?7, label_text = ?8, media_note = ?9,
            hdd_interface = ?10, imaging_success = ?11, image_filename = ?12, interface = ?13,
            imaging_software = ?14, interpretation_success = ?15, imaged_by = ?16,
            imaging_note = ?17, image_format = ?18, box_number = ?19, original_id = ?20,
            disposition_note = ?21, status = ?22, stock_unit = ?23, stock_size_num = ?24,
            is_refreshed = ?25, is_transferred = ?26, content_type = ?27, structure = ?28,
            location = ?29
        WHERE id = ?1
        "#,
        params![
            e.id.to_string(),
            millis(&e.updated_at),
            e.updated_by,
            e.media_id,
            e.mediatype,
            e.manufacturer,
            e.manufacturer_serial,
            e.label_text,
            e.media_note,
            e.hdd_interface,
            e.imaging_success,
            e.image_filename,
            e.interface,
            e.imaging_software,
            e.interpretation_success,
            e.imaged_by,
            e.imaging_note,
            e.image_format,
            e.box_number,
            e.original_id,
            e.disposition_note,
            e.status,
            e.stock_unit,
            e.stock_size_num,
            e.is_refreshed,
            e.is_transferred,
            e.content_type,
            e.structure,
            e.location
        ],
    )
}

fn db_delete_entry(conn: &Connection, id: Uuid) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM entries WHERE id = ?1", params![id.to_string()])
}

// Users

const USER_COLUMNS: &str = "id, email, salt, encrypted_password, sign_in_count, first_name, \
     last_name, is_active, is_admin, can_access_api, current_ip_address, previous_ip_address, \
     created_at, created_by, updated_at, updated_by";

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        salt: row.get(2)?,
        encrypted_password: row.get(3)?,
        sign_in_count: row.get(4)?,
        first_name: row.get(5)?,
        last_name: row.get(6)?,
        is_active: row.get(7)?,
        is_admin: row.get(8)?,
        can_access_api: row.get(9)?,
        current_ip_address: row.get(10)?,
        previous_ip_address: row.get(11)?,
        created_at: get_time(row, 12)?,
        created_by: row.get(13)?,
        updated_at: get_time(row, 14)?,
        updated_by: row.get(15)?,
    })
}

fn db_list_users(conn: &Connection) -> rusqlite::Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
    let rows = stmt
        .query_map([], map_user_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_load_user(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        map_user_row,
    )
    .optional()
}

fn db_load_user_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
        params![email],
        map_user_row,
    )
    .optional()
}

fn db_insert_user(conn: &Connection, u: &User) -> rusqlite::Result<i64> {
    conn.execute(
        r#"
        INSERT INTO users (
            email, salt, encrypted_password, sign_in_count, first_name, last_name,
            is_active, is_admin, can_access_api, current_ip_address, previous_ip_address,
            created_at, created_by, updated_at, updated_by
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
        params![
            u.email,
            u.salt,
            u.encrypted_password,
            u.sign_in_count,
            u.first_name,
            u.last_name,
            u.is_active,
            u.is_admin,
            u.can_access_api,
            u.current_ip_address,
            u.previous_ip_address,
            millis(&u.created_at),
            u.created_by,
            millis(&u.updated_at),
            u.updated_by
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn db_update_user(conn: &Connection, u: &User) -> rusqlite::Result<usize> {
    conn.execute(
        r#"
        UPDATE users SET
            email = ?2, salt = ?3, encrypted_password = ?4, sign_in_count = ?5,
            first_name = ?6, last_name = ?7, is_active = ?8, is_admin = ?9,
            can_access_api = ?10, current_ip_address = ?11, previous_ip_address = ?12,
            updated_at = ?13, updated_by = ?14
        WHERE id = ?1
        "#,
        params![
            u.id,
            u.email,
            u.salt,
            u.encrypted_password,
            u.sign_in_count,
            u.first_name,
            u.last_name,
            u.is_active,
            u.is_admin,
            u.can_access_api,
            u.current_ip_address,
            u.previous_ip_address,
            millis(&u.updated_at),
            u.updated_by
        ],
    )
}

// Tokens

fn map_token_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Token> {
    let kind: String = row.get(5)?;
    let kind = TokenKind::from_str(&kind)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(err)))?;
    Ok(Token {
        id: row.get(0)?,
        token: row.get(1)?,
        user_id: row.get(2)?,
        is_valid: row.get(3)?,
        expires: get_time(row, 4)?,
        kind,
    })
}

fn db_load_token(conn: &Connection, token: &str) -> rusqlite::Result<Option<Token>> {
    conn.query_row(
        "SELECT id, token, user_id, is_valid, expires, type FROM tokens WHERE token = ?1",
        params![token],
        map_token_row,
    )
    .optional()
}

fn db_insert_token(conn: &Connection, t: &Token) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO tokens (token, user_id, is_valid, expires, type) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            t.token,
            t.user_id,
            t.is_valid,
            millis(&t.expires),
            t.kind.as_str()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn db_expire_token(conn: &Connection, id: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE tokens SET is_valid = 0 WHERE id = ?1 AND is_valid = 1",
        params![id],
    )
}

fn db_expire_user_tokens(
    conn: &Connection,
    user_id: i64,
    kind: TokenKind,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE tokens SET is_valid = 0 WHERE user_id = ?1 AND type = ?2 AND is_valid = 1",
        params![user_id, kind.as_str()],
    )
}

fn db_expire_stale_tokens(conn: &Connection, now: DateTime<Utc>) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE tokens SET is_valid = 0 WHERE is_valid = 1 AND expires < ?1",
        params![millis(&now)],
    )
}

fn db_expire_tokens(conn: &Connection, kind: Option<TokenKind>) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE tokens SET is_valid = 0 WHERE is_valid = 1 AND (?1 IS NULL OR type = ?1)",
        params![kind.map(|k| k.as_str())],
    )
}

impl<C: WithConn> StorageRead for C {
    fn list_repositories(&self) -> Result<Vec<Repository>> {
        Ok(self.with_conn(db_list_repositories)?)
    }

    fn load_repository(&self, id: i64) -> Result<Option<Repository>> {
        Ok(self.with_conn(|conn| db_load_repository(conn, id))?)
    }

    fn list_resources(&self, repository_id: Option<i64>) -> Result<Vec<Resource>> {
        Ok(self.with_conn(|conn| db_list_resources(conn, repository_id))?)
    }

    fn load_resource(&self, id: i64) -> Result<Option<Resource>> {
        Ok(self.with_conn(|conn| db_load_resource(conn, id))?)
    }

    fn list_accessions(&self, resource_id: Option<i64>) -> Result<Vec<Accession>> {
        Ok(self.with_conn(|conn| db_list_accessions(conn, resource_id))?)
    }

    fn load_accession(&self, id: i64) -> Result<Option<Accession>> {
        Ok(self.with_conn(|conn| db_load_accession(conn, id))?)
    }

    fn load_entry(&self, id: Uuid) -> Result<Option<Entry>> {
        Ok(self.with_conn(|conn| db_load_entry(conn, id))?)
    }

    fn load_entry_by_media_id(&self, resource_id: i64, media_id: u32) -> Result<Option<Entry>> {
        Ok(self.with_conn(|conn| db_load_entry_by_media_id(conn, resource_id, media_id))?)
    }

    fn list_entries(&self, scope: &EntryScope, pagination: &Pagination) -> Result<Vec<Entry>> {
        Ok(self.with_conn(|conn| db_list_entries(conn, scope, pagination))?)
    }

    fn count_entries(&self, scope: &EntryScope, mediatype: Option<&str>) -> Result<u64> {
        Ok(self.with_conn(|conn| db_count_entries(conn, scope, mediatype))?)
    }

    fn list_entry_ids(&self, scope: &EntryScope) -> Result<Vec<Uuid>> {
        Ok(self.with_conn(|conn| db_list_entry_ids(conn, scope))?)
    }

    fn scope_entries(&self, scope: &EntryScope) -> Result<Vec<Entry>> {
        Ok(self.with_conn(|conn| db_scope_entries(conn, scope))?)
    }

    fn recent_entries(&self, limit: u32) -> Result<Vec<Entry>> {
        Ok(self.with_conn(|conn| db_recent_entries(conn, limit))?)
    }

    fn next_media_id(&self, resource_id: i64) -> Result<u32> {
        Ok(self.with_conn(|conn| db_next_media_id(conn, resource_id))?)
    }

    fn media_id_exists(
        &self,
        resource_id: i64,
        media_id: u32,
        except: Option<Uuid>,
    ) -> Result<bool> {
        Ok(self.with_conn(|conn| db_media_id_exists(conn, resource_id, media_id, except))?)
    }

    fn csv_rows(&self, scope: &EntryScope, mediatype: Option<&str>) -> Result<Vec<EntryCsvRow>> {
        Ok(self.with_conn(|conn| db_csv_rows(conn, scope, mediatype))?)
    }

    fn record_counts(&self) -> Result<RecordCounts> {
        Ok(self.with_conn(db_record_counts)?)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.with_conn(db_list_users)?)
    }

    fn load_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.with_conn(|conn| db_load_user(conn, id))?)
    }

    fn load_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.with_conn(|conn| db_load_user_by_email(conn, email))?)
    }

    fn load_token(&self, token: &str) -> Result<Option<Token>> {
        Ok(self.with_conn(|conn| db_load_token(conn, token))?)
    }
}

impl<C: WithConn> StorageWrite for C {
    fn insert_repository(&self, repository: &Repository) -> Result<i64> {
        Ok(self.with_conn(|conn| db_insert_repository(conn, repository))?)
    }

    fn update_repository(&self, repository: &Repository) -> Result<usize> {
        Ok(self.with_conn(|conn| db_update_repository(conn, repository))?)
    }

    fn delete_repository(&self, id: i64) -> Result<usize> {
        Ok(self.with_conn(|conn| db_delete(conn, "repositories", id))?)
    }

    fn insert_resource(&self, resource: &Resource) -> Result<i64> {
        Ok(self.with_conn(|conn| db_insert_resource(conn, resource))?)
    }

    fn update_resource(&self, resource: &Resource) -> Result<usize> {
        Ok(self.with_conn(|conn| db_update_resource(conn, resource))?)
    }

    fn delete_resource(&self, id: i64) -> Result<usize> {
        Ok(self.with_conn(|conn| db_delete(conn, "resources", id))?)
    }

    fn insert_accession(&self, accession: &Accession) -> Result<i64> {
        Ok(self.with_conn(|conn| db_insert_accession(conn, accession))?)
    }

    fn update_accession(&self, accession: &Accession) -> Result<usize> {
        Ok(self.with_conn(|conn| db_update_accession(conn, accession))?)
    }

    fn delete_accession(&self, id: i64) -> Result<usize> {
        Ok(self.with_conn(|conn| db_delete(conn, "accessions", id))?)
    }

    fn insert_entry(&self, entry: &Entry) -> Result<()> {
        Ok(self.with_conn(|conn| db_insert_entry(conn, entry))?)
    }

    fn update_entry(&self, entry: &Entry) -> Result<usize> {
        Ok(self.with_conn(|conn| db_update_entry(conn, entry))?)
    }

    fn delete_entry(&self, id: Uuid) -> Result<usize> {
        Ok(self.with_conn(|conn| db_delete_entry(conn, id))?)
    }

    fn reassign_resource_entries(&self, resource_id: i64, repository_id: i64) -> Result<usize> {
        Ok(self.with_conn(|conn| db_reassign_resource_entries(conn, resource_id, repository_id))?)
    }

    fn reassign_accession_entries(
        &self,
        accession_id: i64,
        resource_id: i64,
        repository_id: i64,
    ) -> Result<usize> {
        Ok(self.with_conn(|conn| {
            db_reassign_accession_entries(conn, accession_id, resource_id, repository_id)
        })?)
    }

    fn insert_user(&self, user: &User) -> Result<i64> {
        Ok(self.with_conn(|conn| db_insert_user(conn, user))?)
    }

    fn update_user(&self, user: &User) -> Result<usize> {
        Ok(self.with_conn(|conn| db_update_user(conn, user))?)
    }

    fn insert_token(&self, token: &Token) -> Result<i64> {
        Ok(self.with_conn(|conn| db_insert_token(conn, token))?)
    }

    fn expire_token(&self, id: i64) -> Result<usize> {
        Ok(self.with_conn(|conn| db_expire_token(conn, id))?)
    }

    fn expire_user_tokens(&self, user_id: i64, kind: TokenKind) -> Result<usize> {
        Ok(self.with_conn(|conn| db_expire_user_tokens(conn, user_id, kind))?)
    }

    fn expire_stale_tokens(&self, now: DateTime<Utc>) -> Result<usize> {
        Ok(self.with_conn(|conn| db_expire_stale_tokens(conn, now))?)
    }

    fn expire_tokens(&self, kind: Option<TokenKind>) -> Result<usize> {
        Ok(self.with_conn(|conn| db_expire_tokens(conn, kind))?)
    }
}

impl WithConn for SqliteTx {
    fn with_conn<F, T>(&self, f: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        f(&self.conn)
    }
}

impl StorageTx for SqliteTx {
    fn commit(self) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        Ok(())
    }
}

impl WithConn for SqliteStorage {
    fn with_conn<F, T>(&self, f: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = open(&self.path)?;
        Self::migrate(&conn)?;
        f(&conn)
    }
}

impl Storage for SqliteStorage {
    type Tx = SqliteTx;

    fn begin_tx(&self) -> Result<Self::Tx> {
        let conn = open(&self.path)?;
        Self::migrate(&conn)?;
        conn.execute("BEGIN IMMEDIATE", [])?;
        Ok(SqliteTx { conn })
    }
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
        }
    }

    pub fn reset_all(&self) -> Result<()> {
        if !std::path::Path::new(&self.path).exists() {
            return Ok(());
        }
        std::fs::remove_file(&self.path)?;
        for suffix in ["-wal", "-shm"] {
            let sidecar = format!("{}{}", self.path, suffix);
            if std::path::Path::new(&sidecar).exists() {
                std::fs::remove_file(&sidecar)?;
            }
        }
        Ok(())
    }

    pub fn init(&self) -> Result<()> {
        self.with_conn(|_conn| Ok(()))?;
        Ok(())
    }

    fn migrate(conn: &Connection) -> rusqlite::Result<()> {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version == DB_SCHEMA_VERSION {
            return Ok(());
        }

        log::info!(
            "SQLite schema migration: {} -> {}",
            version,
            DB_SCHEMA_VERSION
        );

        if version == 0 {
            conn.execute_batch(
                r#"
            CREATE TABLE repositories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                created_by INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                updated_by INTEGER NOT NULL
            );
            CREATE TABLE resources (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                collection_code TEXT NOT NULL,
                partner_code TEXT NOT NULL,
                repository_id INTEGER NOT NULL REFERENCES repositories(id),
                created_at INTEGER NOT NULL,
                created_by INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                updated_by INTEGER NOT NULL
            );
            CREATE TABLE accessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                accession_num TEXT NOT NULL,
                accession_note TEXT NOT NULL,
                accession_state TEXT NOT NULL,
                resource_id INTEGER NOT NULL REFERENCES resources(id),
                created_at INTEGER NOT NULL,
                created_by INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                updated_by INTEGER NOT NULL
            );
            CREATE TABLE entries (
                id TEXT PRIMARY KEY,
                created_at INTEGER NOT NULL,
                created_by INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                updated_by INTEGER NOT NULL,
                media_id INTEGER NOT NULL CHECK (media_id >= 1),
                mediatype TEXT NOT NULL,
                manufacturer TEXT NOT NULL,
                manufacturer_serial TEXT NOT NULL,
                label_text TEXT NOT NULL,
                media_note TEXT NOT NULL,
                hdd_interface TEXT NOT NULL,
                imaging_success TEXT NOT NULL,
                image_filename TEXT NOT NULL,
                interface TEXT NOT NULL,
                imaging_software TEXT NOT NULL,
                interpretation_success TEXT NOT NULL,
                imaged_by TEXT NOT NULL,
                imaging_note TEXT NOT NULL,
                image_format TEXT NOT NULL,
                box_number TEXT NOT NULL,
                original_id TEXT NOT NULL,
                disposition_note TEXT NOT NULL,
                status TEXT NOT NULL,
                stock_unit TEXT NOT NULL,
                stock_size_num REAL NOT NULL,
                repository_id INTEGER NOT NULL REFERENCES repositories(id),
                resource_id INTEGER NOT NULL REFERENCES resources(id),
                accession_id INTEGER NOT NULL REFERENCES accessions(id),
                is_refreshed INTEGER NOT NULL,
                is_transferred INTEGER NOT NULL,
                content_type TEXT NOT NULL,
                structure TEXT NOT NULL,
                location TEXT NOT NULL,
                UNIQUE (resource_id, media_id)
            );
            CREATE INDEX entries_accession_idx ON entries(accession_id);
            CREATE INDEX entries_repository_idx ON entries(repository_id);
            CREATE INDEX entries_created_at_idx ON entries(created_at);
            CREATE INDEX entries_updated_at_idx ON entries(updated_at);
            CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                salt TEXT NOT NULL,
                encrypted_password TEXT NOT NULL,
                sign_in_count INTEGER NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                is_active INTEGER NOT NULL,
                is_admin INTEGER NOT NULL,
                can_access_api INTEGER NOT NULL,
                current_ip_address TEXT NOT NULL,
                previous_ip_address TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                created_by INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                updated_by INTEGER NOT NULL
            );
            CREATE TABLE tokens (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                token TEXT NOT NULL UNIQUE,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                is_valid INTEGER NOT NULL,
                expires INTEGER NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('api', 'application'))
            );
            CREATE INDEX tokens_user_type_valid_idx ON tokens(user_id, type) WHERE is_valid = 1;
        "#,
            )?;
            conn.pragma_update(None, "user_version", DB_SCHEMA_VERSION)?;
            return Ok(());
        }

        Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::ErrorCode::SchemaChanged as i32),
            Some("database schema version mismatch; please run with --reset option".to_string()),
        ))
    }
}
