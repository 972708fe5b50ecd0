use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::repository::entities::now;

/// A progress photo of a miniature.
///
/// The bytes are opaque; decoding them is left to whoever displays the photo.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub(crate) id: Uuid,
    pub(crate) data: Vec<u8>,
    pub(crate) date_taken: DateTime<Utc>,
    /// The [`Miniature`](super::Miniature) this photo belongs to, if it has been attached to one.
    /// Only used for lookups, ownership lives on the miniature side.
    pub(crate) miniature: Option<Uuid>,
}

impl Photo {
    /// A photo taken right now.
    pub fn new(data: Vec<u8>) -> Self {
        Self::with_date(data, now())
    }

    pub fn with_date(data: Vec<u8>, date_taken: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            data,
            date_taken,
            miniature: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn date_taken(&self) -> DateTime<Utc> {
        self.date_taken
    }

    pub fn miniature(&self) -> Option<Uuid> {
        self.miniature
    }

    /// Copy of this photo under a fresh id, detached from any miniature.
    pub(crate) fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            data: self.data.clone(),
            date_taken: self.date_taken,
            miniature: None,
        }
    }
}
