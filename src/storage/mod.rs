pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{
    EntryScope, RecordCounts, Storage, StorageRead, StorageTx, StorageWrite,
};
