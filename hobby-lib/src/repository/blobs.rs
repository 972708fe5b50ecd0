use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use uuid::Uuid;

/// Photo bytes, kept out of the database as one file per photo.
#[derive(Debug, Clone)]
pub(crate) struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    /// Open the blob directory under `root`, creating it if needed.
    pub fn new(root: &Path) -> io::Result<Self> {
        let dir = root.join("photos");

        fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Move every blob into a store under `root` and return that store.
    ///
    /// Files are renamed where possible and copied across file systems otherwise. Files that
    /// were moved before a failure stay in the new store.
    pub fn move_to(&self, root: &Path) -> io::Result<Self> {
        let target = Self::new(root)?;
        if target.dir == self.dir {
            return Ok(target);
        }

        for entry in fs::read_dir(&self.dir)? {
            let from = entry?.path();
            let Some(name) = from.file_name() else {
                continue;
            };
            let to = target.dir.join(name);

            if fs::rename(&from, &to).is_err() {
                fs::copy(&from, &to)?;
                fs::remove_file(&from)?;
            }
        }

        Ok(target)
    }

    pub fn path(&self, id: Uuid) -> PathBuf {
        self.dir.join(id.simple().to_string())
    }

    pub fn write(&self, id: Uuid, data: &[u8]) -> io::Result<()> {
        fs::write(self.path(id), data)
    }

    pub fn read(&self, id: Uuid) -> io::Result<Vec<u8>> {
        fs::read(self.path(id))
    }

    /// Remove a blob. Removing one that is already gone is not an error.
    pub fn remove(&self, id: Uuid) -> io::Result<()> {
        match fs::remove_file(self.path(id)) {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_write_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = BlobStore::new(dir.path()).unwrap();
        let id = Uuid::new_v4();

        blobs.write(id, &[1, 2, 3]).unwrap();
        assert!(blobs.path(id).exists());
        assert_eq!(blobs.read(id).unwrap(), vec![1, 2, 3]);

        blobs.remove(id).unwrap();
        assert!(!blobs.path(id).exists());

        // Already gone
        blobs.remove(id).unwrap();
    }

    #[test]
    fn test_move_to() {
        let old = tempfile::tempdir().unwrap();
        let new = tempfile::tempdir().unwrap();
        let blobs = BlobStore::new(old.path()).unwrap();
        let id = Uuid::new_v4();
        blobs.write(id, &[4, 5]).unwrap();

        let moved = blobs.move_to(new.path()).unwrap();

        assert_eq!(moved.dir(), new.path().join("photos"));
        assert_eq!(moved.read(id).unwrap(), vec![4, 5]);
        assert!(!blobs.path(id).exists());

        // Moving onto itself keeps everything in place
        let same = moved.move_to(new.path()).unwrap();
        assert_eq!(same.read(id).unwrap(), vec![4, 5]);
    }
}
