use std::path::PathBuf;

use clap::Args;
use hobby_lib::{Repository, query::SortKey};

use crate::Failure;

/// Show or change settings
#[derive(Args, Debug, Clone)]
pub struct Command {
    /// Sort order used by `list` when `--sort` is not given
    #[arg(long, value_enum)]
    sort: Option<SortKey>,
    /// Directory photo files are kept in. Existing photos are moved there.
    #[arg(long)]
    library_dir: Option<PathBuf>,
}

pub fn handle(repo: &mut Repository, cmd: &Command) -> Result<(), Failure> {
    if let Some(dir) = &cmd.library_dir {
        repo.set_library_dir(dir.clone())?;
    }

    let cfg = repo.cfg();
    if let Some(sort) = cmd.sort {
        cfg.write().set_default_sort(sort);
    }
    if cmd.sort.is_some() || cmd.library_dir.is_some() {
        cfg.read().save().map_err(hobby_lib::Error::from)?;
    }

    let cfg = cfg.read();
    println!("{:>16}  {}", "Default sort", cfg.default_sort());
    println!("{:>16}  {}", "Library", cfg.library_dir()?.display());
    println!("{:>16}  {:?}", "Media timeout", cfg.media_timeout());

    Ok(())
}
