use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::repository::entities::{Error, Photo, Result, Status, now};

/// A single miniature (or unit) in the collection.
///
/// This is a plain value. Reading it from the [`Repository`](crate::Repository) gives a snapshot;
/// changes are written back explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Miniature {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) faction: String,
    pub(crate) status: Status,
    pub(crate) date_added: DateTime<Utc>,
    pub(crate) recipe: String,
    pub(crate) notes: String,
    pub(crate) photos: Vec<Photo>,
}

impl Miniature {
    /// Create a new [`Miniature`] with a fresh id, stamped with the current time.
    ///
    /// A miniature without a name can't be shown anywhere, so an empty (or all whitespace) name
    /// is rejected with [`Error::EmptyName`].
    pub fn new(name: &str, faction: &str, status: Status) -> Result<Self> {
        validate_name(name)?;

        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            faction: faction.into(),
            status,
            date_added: now(),
            recipe: String::new(),
            notes: String::new(),
            photos: Vec::new(),
        })
    }

    pub fn with_recipe(mut self, recipe: &str) -> Self {
        self.recipe = recipe.into();
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_photo(mut self, photo: Photo) -> Self {
        self.add_photo(photo);
        self
    }

    // Fields

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        validate_name(name)?;
        self.name = name.into();
        Ok(())
    }

    pub fn faction(&self) -> &str {
        &self.faction
    }

    pub fn set_faction(&mut self, faction: &str) {
        self.faction = faction.into();
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub fn date_added(&self) -> DateTime<Utc> {
        self.date_added
    }

    pub fn recipe(&self) -> &str {
        &self.recipe
    }

    pub fn set_recipe(&mut self, recipe: &str) {
        self.recipe = recipe.into();
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.notes = notes.into();
    }

    // Photos

    /// Photos in the order they were attached.
    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    /// Photos oldest first, which is the order they are displayed in.
    pub fn photos_by_date(&self) -> Vec<&Photo> {
        let mut photos: Vec<&Photo> = self.photos.iter().collect();
        photos.sort_by_key(|p| p.date_taken);
        photos
    }

    /// Attach a photo to this miniature, taking ownership of it.
    pub fn add_photo(&mut self, mut photo: Photo) {
        photo.miniature = Some(self.id);
        self.photos.push(photo);
    }

    /// Detach the photo with the given id, if this miniature owns it.
    pub fn remove_photo(&mut self, photo_id: Uuid) -> Option<Photo> {
        let index = self.photos.iter().position(|p| p.id == photo_id)?;
        let mut photo = self.photos.remove(index);
        photo.miniature = None;
        Some(photo)
    }

    /// The most recent photo, used as the thumbnail.
    ///
    /// When several photos share the latest timestamp, the one attached last wins.
    pub fn cover_photo(&self) -> Option<&Photo> {
        self.photos_by_date().pop()
    }

    pub fn cover_image(&self) -> Option<&[u8]> {
        self.cover_photo().map(Photo::data)
    }

    // Operations

    /// Copy this miniature under a new identity.
    ///
    /// The copy gets a fresh id and is stamped with the current time. Everything else is carried
    /// over, including a deep copy of every photo (each with its own new id). Storing the copy is
    /// up to the caller.
    pub fn duplicate(&self) -> Self {
        let mut copy = Self {
            id: Uuid::new_v4(),
            name: self.name.clone(),
            faction: self.faction.clone(),
            status: self.status,
            date_added: now(),
            recipe: self.recipe.clone(),
            notes: self.notes.clone(),
            photos: Vec::with_capacity(self.photos.len()),
        };

        for photo in &self.photos {
            copy.add_photo(photo.duplicate());
        }

        copy
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::EmptyName);
    }

    Ok(())
}
