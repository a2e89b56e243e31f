mod accession;
mod entry;
mod medialog_error;
mod repository;
mod resource;
mod token;
mod user;

pub use accession::{Accession, AccessionForm};
pub use entry::{Entry, EntryCsvRow, EntryForm, SlewForm, CSV_HEADER, MAX_SLEW};
pub use medialog_error::MedialogError;
pub use repository::{Repository, RepositoryForm};
pub use resource::{Resource, ResourceForm};
pub use token::{Token, TokenKind};
pub use user::{User, UserFlag, UserForm};
