use std::{fs, io, path::PathBuf, sync::Arc, time::Duration};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::{
    fs::{config_dir, data_dir},
    query::SortKey,
};

const CURRENT_CONFIG_VERSION: u16 = 1;
const FILE_NAME: &str = "core.toml";
const MIN_MEDIA_TIMEOUT_SECS: u64 = 1;

/// Handle to the core configuration
pub type Cfg = Arc<RwLock<CoreConfig>>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to access the configuration file: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to serialize the configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// The core configuration, serialized to TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    version: u16,
    /// Where photo files are kept. Defaults to the data directory.
    library_dir: Option<PathBuf>,
    /// Sort order used when none is asked for
    default_sort: SortKey,
    /// How long a single photo may take to load before it is skipped
    media_timeout_secs: u64,
}

impl CoreConfig {
    pub fn load() -> Result<Self, Error> {
        let path = config_dir()?.join(FILE_NAME);

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            Ok(toml::from_str(&contents).unwrap_or_else(|e| {
                warn!("Ignoring invalid config at {}: {e}", path.display());
                Self::default()
            }))
        } else {
            let cfg = Self::default();
            cfg.save()?;
            Ok(cfg)
        }
    }

    pub fn save(&self) -> Result<(), Error> {
        let contents = toml::to_string_pretty(self)?;

        fs::write(config_dir()?.join(FILE_NAME), contents)?;

        Ok(())
    }

    pub fn library_dir(&self) -> io::Result<PathBuf> {
        match &self.library_dir {
            Some(dir) => Ok(dir.clone()),
            None => data_dir(),
        }
    }

    /// Use [`Repository::set_library_dir`](crate::Repository::set_library_dir) so existing photos
    /// move along.
    pub(crate) fn set_library_dir(&mut self, dir: PathBuf) {
        self.library_dir = Some(dir);
    }

    pub fn default_sort(&self) -> SortKey {
        self.default_sort
    }

    pub fn set_default_sort(&mut self, sort: SortKey) {
        self.default_sort = sort;
    }

    /// Never shorter than one second, so a zero in the file can't reject every photo.
    pub fn media_timeout(&self) -> Duration {
        Duration::from_secs(self.media_timeout_secs.max(MIN_MEDIA_TIMEOUT_SECS))
    }

    /// A configuration that keeps photos in a throwaway directory
    #[cfg(test)]
    pub(crate) fn mock() -> Self {
        Self {
            library_dir: Some(tempfile::tempdir().unwrap().keep()),
            ..Default::default()
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            library_dir: None,
            default_sort: SortKey::default(),
            media_timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = CoreConfig::default();

        assert_eq!(cfg.default_sort(), SortKey::Newest);
        assert_eq!(cfg.media_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_file() {
        let cfg: CoreConfig = toml::from_str("default_sort = \"faction\"").unwrap();

        assert_eq!(cfg.default_sort(), SortKey::Faction);
        assert_eq!(cfg.media_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_media_timeout() {
        let cfg: CoreConfig = toml::from_str("media_timeout_secs = 0").unwrap();

        assert_eq!(cfg.media_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_serialize() {
        let mut cfg = CoreConfig::default();
        cfg.set_default_sort(SortKey::Alphabetical);

        let parsed: CoreConfig = toml::from_str(&toml::to_string_pretty(&cfg).unwrap()).unwrap();

        assert_eq!(parsed.default_sort(), SortKey::Alphabetical);
    }
}
