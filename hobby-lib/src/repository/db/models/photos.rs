use agdb::{DbElement, DbId};
use chrono::DateTime;
use uuid::Uuid;

use crate::repository::{
    db::models::miniatures::parse_uuid,
    entities::{Error, Photo, Result},
};

/// A stored photo. The bytes themselves live in the blob store under [`PhotoModel::uuid`].
#[derive(Debug, Clone, DbElement, PartialEq)]
pub(crate) struct PhotoModel {
    pub(crate) db_id: Option<DbId>,
    pub(crate) uuid: String,
    /// The owning miniature's id
    pub(crate) miniature: String,
    /// Milliseconds since the Unix epoch
    pub(crate) date_taken: i64,
    /// Where this photo sits among its siblings, in the order they were attached
    pub(crate) position: u64,
}

impl PhotoModel {
    pub fn new(photo: &Photo, miniature: Uuid, position: u64) -> Self {
        Self {
            db_id: None,
            uuid: photo.id.to_string(),
            miniature: miniature.to_string(),
            date_taken: photo.date_taken.timestamp_millis(),
            position,
        }
    }

    pub fn id(&self) -> Result<Uuid> {
        parse_uuid(&self.uuid)
    }

    pub fn into_entity(self, data: Vec<u8>) -> Result<Photo> {
        let date_taken = DateTime::from_timestamp_millis(self.date_taken)
            .ok_or_else(|| Error::Corrupt(format!("date out of range: {}", self.date_taken)))?;

        Ok(Photo {
            id: parse_uuid(&self.uuid)?,
            data,
            date_taken,
            miniature: Some(parse_uuid(&self.miniature)?),
        })
    }
}
