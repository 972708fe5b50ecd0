use std::{fs, path::PathBuf};

use clap::Subcommand;
use hobby_lib::{
    Repository,
    media::{FileSource, MAX_LIBRARY_SELECTION, load_photos},
};

use crate::{Failure, render};

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Attach photos to a miniature
    Add {
        id: String,
        #[arg(required = true, num_args = 1..=MAX_LIBRARY_SELECTION)]
        paths: Vec<PathBuf>,
    },
    /// Remove a single photo
    Remove { photo_id: String },
    /// Write a miniature's cover photo (or a chosen photo) to a file
    Export {
        id: String,
        out: PathBuf,
        /// Export this photo instead of the cover
        #[arg(long)]
        photo: Option<String>,
    },
}

pub fn handle(repo: &Repository, cmd: &Command) -> Result<(), Failure> {
    match cmd {
        Command::Add { id, paths } => {
            let miniature = render::resolve(repo, id)?;
            let timeout = repo.cfg().read().media_timeout();

            let runtime = tokio::runtime::Runtime::new()?;
            let sources = paths.iter().cloned().map(FileSource);
            let photos = runtime.block_on(load_photos(sources, timeout));

            let skipped = paths.len().saturating_sub(photos.len());
            let added = repo.add_photos(miniature.id(), photos)?;

            println!("Added {} photos to {}", added.len(), miniature.name());
            if skipped > 0 {
                eprintln!("Skipped {skipped} photos that could not be loaded");
            }
        }
        Command::Remove { photo_id } => {
            let photo = render::resolve_photo(repo, photo_id)?;
            repo.remove_photo(photo.id())?;
            println!("Removed photo {}", render::short_id(photo.id()));
        }
        Command::Export { id, out, photo } => {
            let miniature = render::resolve(repo, id)?;
            let data = match photo {
                Some(photo_id) => {
                    let photo = render::resolve_photo(repo, photo_id)?;
                    if photo.miniature() != Some(miniature.id()) {
                        return Err(Failure::Usage(format!(
                            "Photo {photo_id} does not belong to {}",
                            miniature.name()
                        )));
                    }
                    photo.data().to_vec()
                }
                None => miniature
                    .cover_image()
                    .ok_or_else(|| {
                        Failure::Usage(format!("{} has no photos", miniature.name()))
                    })?
                    .to_vec(),
            };

            fs::write(out, data)?;
            println!("Wrote {}", out.display());
        }
    }

    Ok(())
}
