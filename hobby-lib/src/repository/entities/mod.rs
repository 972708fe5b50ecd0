//! Core domain entities.
//!
//! These types represent the miniatures in a collection and their progress photos. They are
//! plain values; the [`Repository`](crate::Repository) is what reads and writes them.

use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;
use uuid::Uuid;

mod miniature;
mod photo;
mod status;

pub use miniature::Miniature;
pub use photo::Photo;
pub use status::Status;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Internal database error {0}")]
    Internal(#[from] agdb::DbError),
    #[error("Photo storage error {0}")]
    Io(#[from] std::io::Error),
    #[error("A miniature must have a name")]
    EmptyName,
    #[error("Nothing with the id {0} exists, it may have been removed")]
    NotFound(Uuid),
    #[error("Something with the id {0} is already stored")]
    AlreadyStored(Uuid),
    #[error("Stored record is malformed: {0}")]
    Corrupt(String),
    #[error("Database was written by a newer version (model version {0})")]
    UnsupportedModelVersion(u64),
}

/// The current time, at the precision timestamps are stored with.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
