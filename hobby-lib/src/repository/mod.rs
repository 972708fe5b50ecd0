use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use parking_lot::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    query::{Stats, View},
    repository::{
        blobs::BlobStore,
        config::{Cfg, CoreConfig},
        db::{
            Db,
            models::{MiniatureModel, PhotoModel},
            stored_id,
        },
        entities::{Error, Result},
    },
};

mod blobs;
mod db;

pub mod config;
pub mod entities;

pub use entities::{Miniature, Photo, Status};

/// Central access point for all persistent data.
///
/// The [`Repository`] owns the database, the photo files and the configuration. Everything it
/// hands out is a snapshot; changes are made by passing values back in.
///
/// A miniature owns its photos. Removing a miniature removes every one of its photos, both the
/// records and the files.
#[derive(Clone, Debug)]
pub struct Repository {
    db: Db,
    cfg: Cfg,
    blobs: BlobStore,
}

impl Repository {
    pub fn new() -> crate::Result<Self> {
        let cfg = CoreConfig::load()?;
        let blobs = BlobStore::new(&cfg.library_dir()?)?;

        Ok(Self {
            db: Db::new()?,
            cfg: Arc::new(RwLock::new(cfg)),
            blobs,
        })
    }

    pub fn cfg(&self) -> Cfg {
        self.cfg.clone()
    }

    /// Keep photo files under `dir` from now on, moving the existing ones there.
    ///
    /// The configuration is updated in memory; call [`CoreConfig::save`] to keep the change.
    pub fn set_library_dir(&mut self, dir: PathBuf) -> Result<()> {
        self.blobs = self.blobs.move_to(&dir)?;
        self.cfg.write().set_library_dir(dir);

        debug!("Moved photo library to {}", self.blobs.dir().display());

        Ok(())
    }

    // Miniatures

    /// Store a new miniature along with its photos.
    pub fn insert(&self, miniature: &Miniature) -> Result<()> {
        if self.contains(miniature.id)? {
            return Err(Error::AlreadyStored(miniature.id));
        }
        for photo in &miniature.photos {
            if self.contains_photo(photo.id)? {
                return Err(Error::AlreadyStored(photo.id));
            }
        }

        self.write_blobs(&miniature.photos)?;

        let photos = miniature
            .photos
            .iter()
            .zip(0..)
            .map(|(photo, position)| PhotoModel::new(photo, miniature.id, position))
            .collect();

        if let Err(err) = self
            .db
            .insert_miniature(MiniatureModel::new(miniature), photos)
        {
            self.discard_blobs(&miniature.photos);
            return Err(err);
        }

        debug!("Added miniature: {}", miniature.name);

        Ok(())
    }

    /// Every stored miniature, oldest first.
    pub fn miniatures(&self) -> Result<Vec<Miniature>> {
        let mut miniatures = self
            .db
            .miniature_models()?
            .into_iter()
            .map(|model| self.load(model))
            .collect::<Result<Vec<_>>>()?;

        miniatures.sort_by_key(|m| m.date_added);

        Ok(miniatures)
    }

    pub fn miniature(&self, id: Uuid) -> Result<Miniature> {
        self.load(self.db.find_miniature(id)?)
    }

    /// Write back the name, faction, status, recipe and notes of a stored miniature.
    ///
    /// The id and date added never change, and photos are managed with
    /// [`Repository::add_photos`] and [`Repository::remove_photo`].
    pub fn update(&self, miniature: &Miniature) -> Result<()> {
        if miniature.name.trim().is_empty() {
            return Err(Error::EmptyName);
        }

        let db_id = stored_id(self.db.find_miniature(miniature.id)?.db_id)?;
        self.db
            .update_miniature(db_id, MiniatureModel::new(miniature))?;

        debug!("Updated miniature: {}", miniature.name);

        Ok(())
    }

    pub fn set_status(&self, id: Uuid, status: Status) -> Result<()> {
        let db_id = stored_id(self.db.find_miniature(id)?.db_id)?;
        self.db.set_field(db_id, "status", status.to_string())?;

        debug!("Set status of {id} to {status}");

        Ok(())
    }

    /// Remove a miniature together with all of its photos.
    pub fn remove(&self, id: Uuid) -> Result<()> {
        let model = self.db.find_miniature(id)?;
        let db_id = stored_id(model.db_id)?;
        let photos = self.db.photo_models(db_id)?;

        let mut ids = photos
            .iter()
            .map(|p| stored_id(p.db_id))
            .collect::<Result<Vec<_>>>()?;
        ids.push(db_id);

        self.db.remove(&ids)?;

        for photo in &photos {
            let photo_id = photo.id()?;
            if let Err(err) = self.blobs.remove(photo_id) {
                warn!("Failed to remove photo file {photo_id}: {err}");
            }
        }

        debug!("Removed miniature: {} ({} photos)", model.name, photos.len());

        Ok(())
    }

    /// Store a copy of the given miniature under a new id and return it.
    pub fn duplicate(&self, id: Uuid) -> Result<Miniature> {
        let copy = self.miniature(id)?.duplicate();
        self.insert(&copy)?;

        Ok(copy)
    }

    // Photos

    /// Attach photos to a stored miniature, after any it already has. Returns the photos as
    /// stored.
    pub fn add_photos(&self, id: Uuid, photos: Vec<Photo>) -> Result<Vec<Photo>> {
        let db_id = stored_id(self.db.find_miniature(id)?.db_id)?;
        let next_position = self
            .db
            .photo_models(db_id)?
            .iter()
            .map(|p| p.position + 1)
            .max()
            .unwrap_or(0);

        let mut attached = Vec::with_capacity(photos.len());
        for mut photo in photos {
            if self.contains_photo(photo.id)? {
                return Err(Error::AlreadyStored(photo.id));
            }
            photo.miniature = Some(id);
            attached.push(photo);
        }

        self.write_blobs(&attached)?;

        let models = attached
            .iter()
            .zip(next_position..)
            .map(|(photo, position)| PhotoModel::new(photo, id, position))
            .collect();

        if let Err(err) = self.db.insert_photos(db_id, models) {
            self.discard_blobs(&attached);
            return Err(err);
        }

        debug!("Added {} photos to {id}", attached.len());

        Ok(attached)
    }

    pub fn remove_photo(&self, photo_id: Uuid) -> Result<()> {
        let model = self.db.find_photo(photo_id)?;
        self.db.remove(&[stored_id(model.db_id)?])?;

        if let Err(err) = self.blobs.remove(photo_id) {
            warn!("Failed to remove photo file {photo_id}: {err}");
        }

        debug!("Removed photo {photo_id} from {}", model.miniature);

        Ok(())
    }

    // Views

    /// The miniatures a list screen should show, in display order.
    pub fn view(&self, view: &View) -> Result<Vec<Miniature>> {
        let all = self.miniatures()?;

        Ok(view.apply(&all).into_iter().cloned().collect())
    }

    pub fn stats(&self) -> Result<Stats> {
        Ok(Stats::compute(&self.miniatures()?))
    }

    fn load(&self, model: MiniatureModel) -> Result<Miniature> {
        let db_id = stored_id(model.db_id)?;

        let mut photos = Vec::new();
        for photo in self.db.photo_models(db_id)? {
            let photo_id = photo.id()?;
            match self.blobs.read(photo_id) {
                Ok(data) => photos.push(photo.into_entity(data)?),
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    warn!("Photo file for {photo_id} is missing, skipping it");
                }
                Err(err) => return Err(err.into()),
            }
        }

        model.into_entity(photos)
    }

    fn contains(&self, id: Uuid) -> Result<bool> {
        match self.db.find_miniature(id) {
            Ok(_) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn contains_photo(&self, id: Uuid) -> Result<bool> {
        match self.db.find_photo(id) {
            Ok(_) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Write the files for `photos`. If any write fails, the ones already written are removed
    /// again.
    fn write_blobs(&self, photos: &[Photo]) -> Result<()> {
        for (written, photo) in photos.iter().enumerate() {
            if let Err(err) = self.blobs.write(photo.id, &photo.data) {
                self.discard_blobs(photos.get(..written).unwrap_or_default());
                return Err(err.into());
            }
        }

        Ok(())
    }

    /// Best effort cleanup of photo files whose records never made it into the database
    fn discard_blobs(&self, photos: &[Photo]) {
        for photo in photos {
            if let Err(err) = self.blobs.remove(photo.id) {
                warn!("Failed to clean up photo file {}: {err}", photo.id);
            }
        }
    }

    #[cfg(test)]
    /// Return a mock version of a [`Repository`] with an in-memory database and a temporary
    /// photo directory.
    pub(crate) fn mock() -> Self {
        let cfg = CoreConfig::mock();
        let blobs = BlobStore::new(&cfg.library_dir().unwrap()).unwrap();

        Self {
            db: Db::in_memory(),
            cfg: Arc::new(RwLock::new(cfg)),
            blobs,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::query::{Shelf, SortKey};

    fn add(repo: &Repository, name: &str, faction: &str, status: Status) -> Miniature {
        let mini = Miniature::new(name, faction, status).unwrap();
        repo.insert(&mini).unwrap();
        mini
    }

    #[test]
    fn test_insert() {
        let repo = Repository::mock();

        let mini = Miniature::new("Librarian", "Blood Angels", Status::Primed)
            .unwrap()
            .with_recipe("Mephiston Red")
            .with_notes("Force axe")
            .with_photo(Photo::new(vec![1, 2, 3]));
        repo.insert(&mini).unwrap();

        let miniatures = repo.miniatures().unwrap();

        assert_eq!(miniatures.len(), 1);
        assert_eq!(miniatures.first().unwrap(), &mini);
        assert_eq!(repo.miniature(mini.id()).unwrap(), mini);
    }

    #[test]
    fn test_insert_twice() {
        let repo = Repository::mock();
        let mini = add(&repo, "Librarian", "Blood Angels", Status::Unbuilt);

        assert!(matches!(
            repo.insert(&mini),
            Err(Error::AlreadyStored(id)) if id == mini.id()
        ));
        assert_eq!(repo.miniatures().unwrap().len(), 1);
    }

    #[test]
    fn test_list() {
        let repo = Repository::mock();

        assert_eq!(repo.miniatures().unwrap().len(), 0);

        add(&repo, "Gretchin", "Goffs", Status::Unbuilt);
        add(&repo, "Warboss", "Goffs", Status::Built);

        assert_eq!(repo.miniatures().unwrap().len(), 2);
    }

    #[test]
    fn test_update() {
        let repo = Repository::mock();
        let mut mini = add(&repo, "Gretchin", "Goffs", Status::Unbuilt);

        mini.set_name("Runtherd").unwrap();
        mini.set_status(Status::Wip);
        mini.set_recipe("Goff Black");
        repo.update(&mini).unwrap();

        let stored = repo.miniature(mini.id()).unwrap();
        assert_eq!(stored.name(), "Runtherd");
        assert_eq!(stored.status(), Status::Wip);
        assert_eq!(stored.recipe(), "Goff Black");
        assert_eq!(stored.date_added(), mini.date_added());
        assert_eq!(repo.miniatures().unwrap().len(), 1);
    }

    #[test]
    fn test_update_missing() {
        let repo = Repository::mock();
        let mini = Miniature::new("Ghost", "Unknown", Status::Unbuilt).unwrap();

        assert!(matches!(repo.update(&mini), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_update_empty_name() {
        let repo = Repository::mock();
        let mut mini = add(&repo, "Gretchin", "Goffs", Status::Unbuilt);
        mini.name = String::new();

        assert!(matches!(repo.update(&mini), Err(Error::EmptyName)));
        assert_eq!(repo.miniature(mini.id()).unwrap().name(), "Gretchin");
    }

    #[test]
    fn test_set_status() {
        let repo = Repository::mock();
        let mini = add(&repo, "Terminator", "Dark Angels", Status::Built);

        repo.set_status(mini.id(), Status::Complete).unwrap();

        assert_eq!(
            repo.miniature(mini.id()).unwrap().status(),
            Status::Complete
        );
    }

    #[test]
    fn test_remove() {
        let repo = Repository::mock();
        let mini = Miniature::new("Terminator", "Dark Angels", Status::Built)
            .unwrap()
            .with_photo(Photo::new(vec![1]))
            .with_photo(Photo::new(vec![2]));
        repo.insert(&mini).unwrap();
        let keep = add(&repo, "Librarian", "Dark Angels", Status::Built);

        let photo_paths: Vec<_> = mini.photos().iter().map(|p| repo.blobs.path(p.id())).collect();
        assert!(photo_paths.iter().all(|p| p.exists()));

        repo.remove(mini.id()).unwrap();

        assert!(photo_paths.iter().all(|p| !p.exists()));
        for photo in mini.photos() {
            assert!(matches!(
                repo.remove_photo(photo.id()),
                Err(Error::NotFound(_))
            ));
        }
        assert!(matches!(
            repo.miniature(mini.id()),
            Err(Error::NotFound(_))
        ));
        assert_eq!(repo.miniatures().unwrap(), vec![keep]);
    }

    #[test]
    fn test_remove_missing() {
        let repo = Repository::mock();

        assert!(matches!(
            repo.remove(Uuid::new_v4()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_duplicate() {
        let repo = Repository::mock();
        let original = Miniature::new("Clone Trooper", "Republic", Status::Wip)
            .unwrap()
            .with_notes("Phase II armour")
            .with_photo(Photo::new(vec![7, 7]));
        repo.insert(&original).unwrap();

        let copy = repo.duplicate(original.id()).unwrap();

        assert_ne!(copy.id(), original.id());
        assert_eq!(repo.miniatures().unwrap().len(), 2);

        let stored = repo.miniature(copy.id()).unwrap();
        assert_eq!(stored.notes(), "Phase II armour");
        assert_eq!(stored.cover_image(), Some(&[7u8, 7][..]));
        assert_ne!(
            stored.photos().first().unwrap().id(),
            original.photos().first().unwrap().id()
        );

        // Removing the copy leaves the original's photos alone
        repo.remove(copy.id()).unwrap();
        assert_eq!(repo.miniature(original.id()).unwrap(), original);
    }

    #[test]
    fn test_add_photos() {
        let repo = Repository::mock();
        let mini = Miniature::new("Deff Dread", "Orks", Status::Primed)
            .unwrap()
            .with_photo(Photo::new(vec![1]));
        repo.insert(&mini).unwrap();

        let added = repo
            .add_photos(mini.id(), vec![Photo::new(vec![2]), Photo::new(vec![3])])
            .unwrap();

        assert!(added.iter().all(|p| p.miniature() == Some(mini.id())));

        let stored = repo.miniature(mini.id()).unwrap();
        let data: Vec<&[u8]> = stored.photos().iter().map(Photo::data).collect();
        assert_eq!(data, vec![&[1u8][..], &[2u8][..], &[3u8][..]]);
        assert!(matches!(
            repo.add_photos(Uuid::new_v4(), vec![Photo::new(vec![4])]),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_add_photos_after_removal() {
        let repo = Repository::mock();
        let mini = Miniature::new("Deff Dread", "Orks", Status::Primed)
            .unwrap()
            .with_photo(Photo::new(vec![1]))
            .with_photo(Photo::new(vec![2]));
        repo.insert(&mini).unwrap();

        repo.remove_photo(mini.photos().first().unwrap().id()).unwrap();
        repo.add_photos(mini.id(), vec![Photo::new(vec![3])]).unwrap();

        let stored = repo.miniature(mini.id()).unwrap();
        let data: Vec<&[u8]> = stored.photos().iter().map(Photo::data).collect();
        assert_eq!(data, vec![&[2u8][..], &[3u8][..]]);
    }

    #[test]
    fn test_remove_photo() {
        let repo = Repository::mock();
        let photo = Photo::new(vec![5]);
        let photo_id = photo.id();
        let mini = Miniature::new("Deff Dread", "Orks", Status::Primed)
            .unwrap()
            .with_photo(photo);
        repo.insert(&mini).unwrap();

        repo.remove_photo(photo_id).unwrap();

        assert!(!repo.blobs.path(photo_id).exists());
        assert!(repo.miniature(mini.id()).unwrap().photos().is_empty());
        assert!(matches!(
            repo.remove_photo(photo_id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_failed_blob_write_leaves_no_files() {
        let repo = Repository::mock();
        let first = Photo::new(vec![1]);
        let second = Photo::new(vec![2]);
        let first_path = repo.blobs.path(first.id());
        // A directory in the way makes the second write fail
        std::fs::create_dir_all(repo.blobs.path(second.id())).unwrap();

        let mini = Miniature::new("Blocked", "Orks", Status::Unbuilt)
            .unwrap()
            .with_photo(first.clone())
            .with_photo(second.clone());

        assert!(matches!(repo.insert(&mini), Err(Error::Io(_))));
        assert!(repo.miniatures().unwrap().is_empty());
        assert!(!first_path.exists());

        let stored = add(&repo, "Stored", "Orks", Status::Unbuilt);
        assert!(matches!(
            repo.add_photos(stored.id(), vec![first, second]),
            Err(Error::Io(_))
        ));
        assert!(!first_path.exists());
        assert!(repo.miniature(stored.id()).unwrap().photos().is_empty());
    }

    #[test]
    fn test_set_library_dir() {
        let mut repo = Repository::mock();
        let mini = Miniature::new("Kommando", "Orks", Status::Built)
            .unwrap()
            .with_photo(Photo::new(vec![7, 8]));
        repo.insert(&mini).unwrap();
        let old_path = repo.blobs.path(mini.photos().first().unwrap().id());

        let new_dir = tempfile::tempdir().unwrap();
        repo.set_library_dir(new_dir.path().to_path_buf()).unwrap();

        assert!(!old_path.exists());
        assert_eq!(repo.cfg().read().library_dir().unwrap(), new_dir.path());
        let loaded = repo.miniature(mini.id()).unwrap();
        assert_eq!(loaded.cover_image(), Some(&[7u8, 8][..]));

        repo.remove(mini.id()).unwrap();
        assert_eq!(std::fs::read_dir(repo.blobs.dir()).unwrap().count(), 0);
    }

    #[test]
    fn test_backlog_and_gallery() {
        let repo = Repository::mock();
        add(&repo, "Soldier A", "Army", Status::Unbuilt);
        add(&repo, "Soldier B", "Army", Status::Wip);
        add(&repo, "General", "Army", Status::Complete);

        let backlog = repo.view(&View::new(Shelf::Backlog)).unwrap();
        let gallery = repo.view(&View::new(Shelf::Gallery)).unwrap();

        assert_eq!(backlog.len(), 2);
        assert!(backlog.iter().any(|m| m.name() == "Soldier A"));
        assert!(backlog.iter().any(|m| m.name() == "Soldier B"));
        assert!(!backlog.iter().any(|m| m.name() == "General"));

        assert_eq!(gallery.len(), 1);
        assert_eq!(gallery.first().unwrap().name(), "General");
    }

    #[test]
    fn test_view_search_and_sort() {
        let repo = Repository::mock();
        add(&repo, "Zulu Squad", "Orks", Status::Unbuilt);
        add(&repo, "Alpha Squad", "Orks", Status::Primed);
        add(&repo, "Intercessor", "Ultramarines", Status::Wip);

        let view = View::new(Shelf::Backlog)
            .with_query("squad")
            .with_sort(SortKey::Alphabetical);
        let names: Vec<String> = repo
            .view(&view)
            .unwrap()
            .iter()
            .map(|m| m.name().to_string())
            .collect();

        assert_eq!(names, vec!["Alpha Squad", "Zulu Squad"]);
    }

    #[test]
    fn test_stats() {
        let repo = Repository::mock();
        add(&repo, "Boyz", "Orks", Status::Unbuilt);
        add(&repo, "Nobz", "Orks", Status::Complete);
        add(&repo, "Warriors", "Necrons", Status::Complete);

        let stats = repo.stats().unwrap();

        assert_eq!(stats.total, 3);
        assert_eq!(stats.status_counts.get(&Status::Complete), Some(&2));
        assert_eq!(stats.factions.first().unwrap().faction, "Orks");
        assert_eq!(stats.factions.first().unwrap().count, 2);
    }
}
