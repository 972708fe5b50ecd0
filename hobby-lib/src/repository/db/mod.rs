use std::sync::Arc;

use agdb::{DbAny, DbId, DbValue, QueryBuilder, QueryId, QueryResult};
use derive_more::Deref;
use parking_lot::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    fs::state_dir,
    repository::{
        db::models::{CURRENT_MODEL_VERSION, MiniatureModel, ModelVersion, PhotoModel},
        entities::{Error, Result},
    },
};

pub(crate) mod models;

#[derive(Debug, Clone, Deref)]
pub(crate) struct Db {
    #[deref]
    db: Arc<RwLock<DbAny>>,
}

impl Db {
    /// Open (or create) the database in the state directory.
    pub fn new() -> Result<Self> {
        let path = state_dir()?.join("data.db");

        let mut db = Self {
            db: Arc::new(RwLock::new(DbAny::new_file(&path.to_string_lossy())?)),
        };

        db.init()?;

        Ok(db)
    }

    fn init(&mut self) -> Result<()> {
        let alias_count = self
            .db
            .read()
            .exec(QueryBuilder::select().aliases().query())?
            .result;

        if alias_count == 0 {
            self.db.write().exec_mut(
                // Insert aliases if they don't exist
                QueryBuilder::insert()
                    .nodes()
                    .aliases([
                        // Root element nodes
                        "miniatures",
                        "photos",
                        // State nodes
                        "model_version",
                    ])
                    .query(),
            )?;

            info!("Initialized empty database");
        }

        // Fetch the current model version (if any)
        let result = self.db.read().exec(
            QueryBuilder::select()
                .elements::<ModelVersion>()
                .search()
                .from("model_version")
                .where_()
                .neighbor()
                .query(),
        )?;

        let versions: Vec<ModelVersion> = result.try_into()?;

        match versions.into_iter().next() {
            Some(mv) if mv.version() > CURRENT_MODEL_VERSION => {
                return Err(Error::UnsupportedModelVersion(mv.version()));
            }
            Some(mv) if mv.version() < CURRENT_MODEL_VERSION => {
                self.backup()?;
                self.migrate(&mv)?;
            }
            Some(_) => {}
            None => {
                // Insert default ModelVersion if missing
                self.db.write().transaction_mut(|t| -> Result<()> {
                    let model_version_id = first_id(
                        t.exec_mut(
                            QueryBuilder::insert()
                                .element(ModelVersion::default())
                                .query(),
                        )?,
                    )?;

                    t.exec_mut(
                        QueryBuilder::insert()
                            .edges()
                            .from("model_version")
                            .to(model_version_id)
                            .query(),
                    )?;

                    Ok(())
                })?;
            }
        }

        Ok(())
    }

    /// Perform a backup of the database
    fn backup(&self) -> Result<()> {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let path = state_dir()?.join(format!("data-{}.db.bak", timestamp));

        self.db.write().backup(&path.to_string_lossy())?;

        info!("Backed up database to {}", path.display());

        Ok(())
    }

    /// Bring an older database up to [`CURRENT_MODEL_VERSION`]. No layout change has happened
    /// yet, so only the stored version is bumped.
    fn migrate(&self, from: &ModelVersion) -> Result<()> {
        let db_id = from
            .db_id()
            .ok_or_else(|| Error::Corrupt("model version without an id".into()))?;

        self.db.write().exec_mut(
            QueryBuilder::insert()
                .values([[("version", CURRENT_MODEL_VERSION).into()]])
                .ids(db_id)
                .query(),
        )?;

        warn!(
            "Migrated database from model version {} to {}",
            from.version(),
            CURRENT_MODEL_VERSION
        );

        Ok(())
    }

    /// Create a memory backed database for use in tests
    #[cfg(test)]
    pub(crate) fn in_memory() -> Self {
        let mut db = Self {
            db: Arc::new(RwLock::new(DbAny::new_memory("test").unwrap())),
        };

        db.init().unwrap();

        db
    }

    // Miniatures

    /// Insert a miniature and its photos, linking each photo to both the miniature and the root
    /// "photos" node.
    pub fn insert_miniature(
        &self,
        model: MiniatureModel,
        photos: Vec<PhotoModel>,
    ) -> Result<DbId> {
        self.db.write().transaction_mut(|t| -> Result<DbId> {
            let miniature_id =
                first_id(t.exec_mut(QueryBuilder::insert().element(model).query())?)?;

            t.exec_mut(
                QueryBuilder::insert()
                    .edges()
                    .from("miniatures")
                    .to(miniature_id)
                    .query(),
            )?;

            for photo in photos {
                let photo_id =
                    first_id(t.exec_mut(QueryBuilder::insert().element(photo).query())?)?;

                t.exec_mut(
                    QueryBuilder::insert()
                        .edges()
                        .from([QueryId::from("photos"), QueryId::from(miniature_id)])
                        .to(photo_id)
                        .query(),
                )?;
            }

            Ok(miniature_id)
        })
    }

    pub fn miniature_models(&self) -> Result<Vec<MiniatureModel>> {
        let models: Vec<MiniatureModel> = self
            .db
            .read()
            .exec(
                QueryBuilder::select()
                    .elements::<MiniatureModel>()
                    .search()
                    .from("miniatures")
                    .where_()
                    .node()
                    .and()
                    .neighbor()
                    .query(),
            )?
            .try_into()?;

        Ok(models)
    }

    pub fn find_miniature(&self, id: Uuid) -> Result<MiniatureModel> {
        let uuid = id.to_string();
        let models: Vec<MiniatureModel> = self
            .db
            .read()
            .exec(
                QueryBuilder::select()
                    .elements::<MiniatureModel>()
                    .search()
                    .from("miniatures")
                    .where_()
                    .neighbor()
                    .and()
                    .key("uuid")
                    .value(uuid.as_str())
                    .query(),
            )?
            .try_into()?;

        models.into_iter().next().ok_or(Error::NotFound(id))
    }

    /// Overwrite the scalar fields of a stored miniature. Its id and date added are left alone.
    pub fn update_miniature(&self, db_id: DbId, model: MiniatureModel) -> Result<()> {
        self.db.write().exec_mut(
            QueryBuilder::insert()
                .values([[
                    ("name", model.name).into(),
                    ("faction", model.faction).into(),
                    ("status", model.status).into(),
                    ("recipe", model.recipe).into(),
                    ("notes", model.notes).into(),
                ]])
                .ids(db_id)
                .query(),
        )?;

        Ok(())
    }

    pub fn set_field<T>(&self, db_id: DbId, field: &str, value: T) -> Result<()>
    where
        T: Into<DbValue>,
    {
        self.db.write().exec_mut(
            QueryBuilder::insert()
                .values([[(field, value).into()]])
                .ids(db_id)
                .query(),
        )?;

        Ok(())
    }

    // Photos

    /// Link new photos to an already stored miniature.
    pub fn insert_photos(&self, miniature_id: DbId, photos: Vec<PhotoModel>) -> Result<()> {
        self.db.write().transaction_mut(|t| -> Result<()> {
            for photo in photos {
                let photo_id =
                    first_id(t.exec_mut(QueryBuilder::insert().element(photo).query())?)?;

                t.exec_mut(
                    QueryBuilder::insert()
                        .edges()
                        .from([QueryId::from("photos"), QueryId::from(miniature_id)])
                        .to(photo_id)
                        .query(),
                )?;
            }

            Ok(())
        })
    }

    /// All photos owned by the given miniature, in the order they were attached.
    pub fn photo_models(&self, miniature_id: DbId) -> Result<Vec<PhotoModel>> {
        let mut models: Vec<PhotoModel> = self
            .db
            .read()
            .exec(
                QueryBuilder::select()
                    .elements::<PhotoModel>()
                    .search()
                    .from(miniature_id)
                    .where_()
                    .node()
                    .and()
                    .neighbor()
                    .query(),
            )?
            .try_into()?;

        models.sort_by_key(|p| p.position);

        Ok(models)
    }

    pub fn find_photo(&self, id: Uuid) -> Result<PhotoModel> {
        let uuid = id.to_string();
        let models: Vec<PhotoModel> = self
            .db
            .read()
            .exec(
                QueryBuilder::select()
                    .elements::<PhotoModel>()
                    .search()
                    .from("photos")
                    .where_()
                    .neighbor()
                    .and()
                    .key("uuid")
                    .value(uuid.as_str())
                    .query(),
            )?
            .try_into()?;

        models.into_iter().next().ok_or(Error::NotFound(id))
    }

    /// Remove the given elements (and with them every edge touching them) in one transaction.
    pub fn remove(&self, ids: &[DbId]) -> Result<()> {
        self.db.write().transaction_mut(|t| -> Result<()> {
            for id in ids {
                t.exec_mut(QueryBuilder::remove().ids(*id).query())?;
            }

            Ok(())
        })
    }
}

/// The id of the first element of an insert's result
fn first_id(result: QueryResult) -> Result<DbId> {
    result
        .elements
        .first()
        .map(|e| e.id)
        .ok_or_else(|| Error::Corrupt("insert returned no elements".into()))
}

/// Resolve an element id stored in a model. Models fetched from the database always carry one.
pub(crate) fn stored_id(db_id: Option<DbId>) -> Result<DbId> {
    db_id.ok_or_else(|| Error::Corrupt("stored element without an id".into()))
}
