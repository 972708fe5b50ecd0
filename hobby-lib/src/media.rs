//! Loading photo bytes from wherever the user picked them.
//!
//! Each fetch is independent. Fetches that fail or take too long are dropped with a warning and
//! never reach the miniature being edited.

use std::{
    fmt::Display,
    future::Future,
    io,
    path::PathBuf,
    time::Duration,
};

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::repository::entities::Photo;

/// The most photos that can be picked from the library in one go.
pub const MAX_LIBRARY_SELECTION: usize = 5;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read photo: {0}")]
    Io(#[from] io::Error),
    #[error("Photo took longer than {0:?} to load")]
    TimedOut(Duration),
    #[error("Photo is empty")]
    Empty,
}

/// Somewhere a single photo's bytes can be fetched from.
pub trait MediaSource: Display + Send + 'static {
    fn fetch(self) -> impl Future<Output = Result<Vec<u8>, Error>> + Send;
}

/// A photo stored as a file, e.g. one picked from the photo library or dropped by a camera app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource(pub PathBuf);

impl Display for FileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl MediaSource for FileSource {
    async fn fetch(self) -> Result<Vec<u8>, Error> {
        Ok(tokio::fs::read(&self.0).await?)
    }
}

/// Fetch one photo, giving up after `timeout`.
pub async fn load_photo<S: MediaSource>(source: S, timeout: Duration) -> Result<Photo, Error> {
    let data = tokio::time::timeout(timeout, source.fetch())
        .await
        .map_err(|_| Error::TimedOut(timeout))??;

    if data.is_empty() {
        return Err(Error::Empty);
    }

    Ok(Photo::new(data))
}

/// Fetch every source concurrently and return the photos that loaded.
///
/// Photos come back in the order they finished loading, not the order they were asked for. A
/// source that fails or times out is skipped.
pub async fn load_photos<S, I>(sources: I, timeout: Duration) -> Vec<Photo>
where
    S: MediaSource,
    I: IntoIterator<Item = S>,
{
    let mut tasks = JoinSet::new();
    for source in sources {
        tasks.spawn(async move {
            let label = source.to_string();
            (label, load_photo(source, timeout).await)
        });
    }

    let mut photos = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((label, Ok(photo))) => {
                debug!("Loaded photo from {label}");
                photos.push(photo);
            }
            Ok((label, Err(err))) => warn!("Skipping photo from {label}: {err}"),
            Err(err) => warn!("Photo loading task failed: {err}"),
        }
    }

    photos
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;

    /// A source that never finishes in time
    struct Stalled;

    impl Display for Stalled {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "stalled")
        }
    }

    impl MediaSource for Stalled {
        async fn fetch(self) -> Result<Vec<u8>, Error> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![1])
        }
    }

    #[tokio::test]
    async fn test_load_photos() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("b.jpg");
        fs::write(&a, [1u8, 2]).unwrap();
        fs::write(&b, [3u8]).unwrap();

        let photos = load_photos([FileSource(a), FileSource(b)], Duration::from_secs(5)).await;

        let mut data: Vec<Vec<u8>> = photos.iter().map(|p| p.data().to_vec()).collect();
        data.sort();
        assert_eq!(data, vec![vec![1, 2], vec![3]]);
    }

    #[tokio::test]
    async fn test_failures_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.jpg");
        let empty = dir.path().join("empty.jpg");
        fs::write(&good, [9u8]).unwrap();
        fs::write(&empty, b"").unwrap();

        let photos = load_photos(
            [
                FileSource(good),
                FileSource(empty),
                FileSource(dir.path().join("missing.jpg")),
            ],
            Duration::from_secs(5),
        )
        .await;

        assert_eq!(photos.len(), 1);
        assert_eq!(photos.first().unwrap().data(), &[9]);
    }

    #[tokio::test]
    async fn test_timeout() {
        let result = load_photo(Stalled, Duration::from_millis(20)).await;
        assert!(matches!(result, Err(Error::TimedOut(_))));

        let photos = load_photos([Stalled, Stalled], Duration::from_millis(20)).await;
        assert!(photos.is_empty());
    }
}
