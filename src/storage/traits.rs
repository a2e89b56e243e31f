use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::pagination::Pagination;
use crate::summary::ReportFilter;
use crate::types::{
    Accession, Entry, EntryCsvRow, Repository, Resource, Token, TokenKind, User,
};

/// Which entries a listing, summary or export covers.
#[derive(Clone, Debug, PartialEq)]
pub enum EntryScope {
    All,
    Repository(i64),
    Resource(i64),
    Accession(i64),
    Created(ReportFilter),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub repositories: u64,
    pub resources: u64,
    pub accessions: u64,
    pub entries: u64,
    pub users: u64,
}

pub trait StorageRead {
    fn list_repositories(&self) -> Result<Vec<Repository>>;
    fn load_repository(&self, id: i64) -> Result<Option<Repository>>;

    fn list_resources(&self, repository_id: Option<i64>) -> Result<Vec<Resource>>;
    fn load_resource(&self, id: i64) -> Result<Option<Resource>>;

    fn list_accessions(&self, resource_id: Option<i64>) -> Result<Vec<Accession>>;
    fn load_accession(&self, id: i64) -> Result<Option<Accession>>;

    fn load_entry(&self, id: Uuid) -> Result<Option<Entry>>;
    fn load_entry_by_media_id(&self, resource_id: i64, media_id: u32) -> Result<Option<Entry>>;
    fn list_entries(&self, scope: &EntryScope, pagination: &Pagination) -> Result<Vec<Entry>>;
    fn count_entries(&self, scope: &EntryScope, mediatype: Option<&str>) -> Result<u64>;
    fn list_entry_ids(&self, scope: &EntryScope) -> Result<Vec<Uuid>>;
    /// Every entry in `scope`, unpaginated.
    fn scope_entries(&self, scope: &EntryScope) -> Result<Vec<Entry>>;
    fn recent_entries(&self, limit: u32) -> Result<Vec<Entry>>;
    fn next_media_id(&self, resource_id: i64) -> Result<u32>;
    fn media_id_exists(&self, resource_id: i64, media_id: u32, except: Option<Uuid>)
        -> Result<bool>;
    fn csv_rows(&self, scope: &EntryScope, mediatype: Option<&str>)
        -> Result<Vec<EntryCsvRow>>;
    fn record_counts(&self) -> Result<RecordCounts>;

    fn list_users(&self) -> Result<Vec<User>>;
    fn load_user(&self, id: i64) -> Result<Option<User>>;
    fn load_user_by_email(&self, email: &str) -> Result<Option<User>>;

    fn load_token(&self, token: &str) -> Result<Option<Token>>;
}

pub trait StorageWrite {
    fn insert_repository(&self, repository: &Repository) -> Result<i64>;
    fn update_repository(&self, repository: &Repository) -> Result<usize>;
    fn delete_repository(&self, id: i64) -> Result<usize>;

    fn insert_resource(&self, resource: &Resource) -> Result<i64>;
    fn update_resource(&self, resource: &Resource) -> Result<usize>;
    fn delete_resource(&self, id: i64) -> Result<usize>;

    fn insert_accession(&self, accession: &Accession) -> Result<i64>;
    fn update_accession(&self, accession: &Accession) -> Result<usize>;
    fn delete_accession(&self, id: i64) -> Result<usize>;

    fn insert_entry(&self, entry: &Entry) -> Result<()>;
    fn update_entry(&self, entry: &Entry) -> Result<usize>;
    fn delete_entry(&self, id: Uuid) -> Result<usize>;
    /// Point every entry of a resource at `repository_id`.
    fn reassign_resource_entries(&self, resource_id: i64, repository_id: i64) -> Result<usize>;
    /// Point every entry of an accession at a new resource and repository.
    fn reassign_accession_entries(
        &self,
        accession_id: i64,
        resource_id: i64,
        repository_id: i64,
    ) -> Result<usize>;

    fn insert_user(&self, user: &User) -> Result<i64>;
    fn update_user(&self, user: &User) -> Result<usize>;

    fn insert_token(&self, token: &Token) -> Result<i64>;
    fn expire_token(&self, id: i64) -> Result<usize>;
    /// Invalidate every valid token of `kind` held by `user_id`.
    fn expire_user_tokens(&self, user_id: i64, kind: TokenKind) -> Result<usize>;
    /// Invalidate valid tokens whose expiry is before `now`.
    fn expire_stale_tokens(&self, now: DateTime<Utc>) -> Result<usize>;
    fn expire_tokens(&self, kind: Option<TokenKind>) -> Result<usize>;
}

pub trait StorageTx: StorageRead + StorageWrite {
    fn commit(self) -> Result<()>;
}

pub trait Storage: StorageRead + StorageWrite {
    type Tx: StorageTx;

    fn begin_tx(&self) -> Result<Self::Tx>;
}
