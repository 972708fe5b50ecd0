//! Catalog of painted (and not yet painted) miniatures.
//!
//! All persistent state goes through the [`Repository`]. The functions in [`query`] derive the
//! backlog, gallery and statistics views from a snapshot of it.

use thiserror::Error;

pub mod fs;
pub mod media;
pub mod query;
pub mod repository;

pub use repository::Repository;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Repository(#[from] repository::entities::Error),
    #[error(transparent)]
    Config(#[from] repository::config::Error),
    #[error("Failed to prepare application directories: {0}")]
    Dirs(#[from] std::io::Error),
}
