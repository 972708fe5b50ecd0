use agdb::{DbElement, DbId};
use chrono::DateTime;
use uuid::Uuid;

use crate::repository::entities::{Error, Miniature, Photo, Result, Status};

#[derive(Debug, Clone, DbElement, PartialEq)]
pub(crate) struct MiniatureModel {
    pub(crate) db_id: Option<DbId>,
    pub(crate) uuid: String,
    pub(crate) name: String,
    pub(crate) faction: String,
    /// Display label of the [`Status`]
    pub(crate) status: String,
    /// Milliseconds since the Unix epoch
    pub(crate) date_added: i64,
    pub(crate) recipe: String,
    pub(crate) notes: String,
}

impl MiniatureModel {
    pub fn new(miniature: &Miniature) -> Self {
        Self {
            db_id: None,
            uuid: miniature.id.to_string(),
            name: miniature.name.clone(),
            faction: miniature.faction.clone(),
            status: miniature.status.to_string(),
            date_added: miniature.date_added.timestamp_millis(),
            recipe: miniature.recipe.clone(),
            notes: miniature.notes.clone(),
        }
    }

    /// Rebuild the [`Miniature`] this model was stored from.
    pub fn into_entity(self, photos: Vec<Photo>) -> Result<Miniature> {
        let status = self
            .status
            .parse::<Status>()
            .map_err(|_| Error::Corrupt(format!("unknown status '{}'", self.status)))?;
        let date_added = DateTime::from_timestamp_millis(self.date_added)
            .ok_or_else(|| Error::Corrupt(format!("date out of range: {}", self.date_added)))?;

        Ok(Miniature {
            id: parse_uuid(&self.uuid)?,
            name: self.name,
            faction: self.faction,
            status,
            date_added,
            recipe: self.recipe,
            notes: self.notes,
            photos,
        })
    }
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|_| Error::Corrupt(format!("invalid id '{s}'")))
}
