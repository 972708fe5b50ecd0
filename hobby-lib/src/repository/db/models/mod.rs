use agdb::{DbElement, DbId};

mod miniatures;
mod photos;

pub(crate) use miniatures::MiniatureModel;
pub(crate) use photos::PhotoModel;

/// Bumped whenever the shape of a stored model changes.
pub(crate) const CURRENT_MODEL_VERSION: u64 = 1;

#[derive(Debug, Clone, DbElement, PartialEq)]
pub(crate) struct ModelVersion {
    db_id: Option<DbId>,
    version: u64,
}

impl ModelVersion {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn db_id(&self) -> Option<DbId> {
        self.db_id
    }
}

impl Default for ModelVersion {
    fn default() -> Self {
        Self {
            db_id: None,
            version: CURRENT_MODEL_VERSION,
        }
    }
}
