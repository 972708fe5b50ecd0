use std::path::PathBuf;

use clap::Subcommand;
use colored::Colorize;
use hobby_lib::{
    Repository,
    media::{FileSource, MAX_LIBRARY_SELECTION, load_photos},
    query::{Shelf, SortKey, View},
    repository::{Miniature, Status},
};

use crate::{Failure, render};

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Add a new miniature
    Add {
        name: String,
        #[arg(short, long, default_value = "")]
        faction: String,
        #[arg(short, long, value_enum, default_value_t = Status::Unbuilt)]
        status: Status,
        /// Paint recipe
        #[arg(long, default_value = "")]
        recipe: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Progress photos to attach
        #[arg(short, long = "photo", num_args = 1..=MAX_LIBRARY_SELECTION)]
        photos: Vec<PathBuf>,
    },
    /// List the backlog, or the gallery of finished miniatures
    List {
        /// Show finished miniatures instead of the backlog
        #[arg(short, long)]
        gallery: bool,
        /// Only show miniatures whose name or faction contains this
        #[arg(short = 'q', long, default_value = "")]
        search: String,
        /// Defaults to the configured sort order
        #[arg(long, value_enum)]
        sort: Option<SortKey>,
    },
    /// Show everything about one miniature
    Show { id: String },
    /// Change the details of a miniature
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        faction: Option<String>,
        #[arg(short, long, value_enum)]
        status: Option<Status>,
        #[arg(long)]
        recipe: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Change how far along a miniature is
    Status {
        id: String,
        #[arg(value_enum)]
        status: Status,
    },
    /// Add a copy of a miniature, photos included
    Duplicate { id: String },
    /// Remove a miniature and all of its photos
    Remove { id: String },
}

pub fn handle(repo: &Repository, cmd: &Command) -> Result<(), Failure> {
    match cmd {
        Command::Add {
            name,
            faction,
            status,
            recipe,
            notes,
            photos,
        } => {
            let mut miniature = Miniature::new(name, faction, *status)?
                .with_recipe(recipe)
                .with_notes(notes);

            if !photos.is_empty() {
                let timeout = repo.cfg().read().media_timeout();
                let runtime = tokio::runtime::Runtime::new()?;
                let sources = photos.iter().cloned().map(FileSource);
                for photo in runtime.block_on(load_photos(sources, timeout)) {
                    miniature.add_photo(photo);
                }
            }

            repo.insert(&miniature)?;
            println!("Added {}", render::row(&miniature));
        }
        Command::List {
            gallery,
            search,
            sort,
        } => {
            let shelf = if *gallery {
                Shelf::Gallery
            } else {
                Shelf::Backlog
            };
            let sort = sort.unwrap_or_else(|| repo.cfg().read().default_sort());
            let view = View::new(shelf).with_query(search).with_sort(sort);

            let miniatures = repo.view(&view)?;
            if miniatures.is_empty() {
                print_empty(&view);
            }
            for miniature in &miniatures {
                println!("{}", render::row(miniature));
            }
        }
        Command::Show { id } => show(&render::resolve(repo, id)?),
        Command::Edit {
            id,
            name,
            faction,
            status,
            recipe,
            notes,
        } => {
            let mut miniature = render::resolve(repo, id)?;

            if let Some(name) = name {
                miniature.set_name(name)?;
            }
            if let Some(faction) = faction {
                miniature.set_faction(faction);
            }
            if let Some(status) = status {
                miniature.set_status(*status);
            }
            if let Some(recipe) = recipe {
                miniature.set_recipe(recipe);
            }
            if let Some(notes) = notes {
                miniature.set_notes(notes);
            }

            repo.update(&miniature)?;
            println!("Updated {}", render::row(&miniature));
        }
        Command::Status { id, status } => {
            let miniature = render::resolve(repo, id)?;
            repo.set_status(miniature.id(), *status)?;
            println!("{} is now {}", miniature.name().bold(), render::status(*status));
        }
        Command::Duplicate { id } => {
            let original = render::resolve(repo, id)?;
            let copy = repo.duplicate(original.id())?;
            println!("Added {}", render::row(&copy));
        }
        Command::Remove { id } => {
            let miniature = render::resolve(repo, id)?;
            repo.remove(miniature.id())?;
            println!("Removed {}", miniature.name().bold());
        }
    }

    Ok(())
}

fn print_empty(view: &View) {
    let (title, hint) = match (view.shelf, view.is_searching()) {
        (_, true) => ("No Results", "Check your spelling."),
        (Shelf::Backlog, false) => ("No Backlog", "You're all caught up!"),
        (Shelf::Gallery, false) => ("No Finished Miniatures", "Nothing has been completed yet."),
    };

    println!("{}", title.bold());
    println!("{}", hint.dimmed());
}

fn show(miniature: &Miniature) {
    println!("{}", miniature.name().bold().underline());
    println!("{:>12}  {}", "Id", miniature.id());
    println!("{:>12}  {}", "Faction", miniature.faction());
    println!("{:>12}  {}", "Status", render::status(miniature.status()));
    println!("{:>12}  {}", "Date Added", render::date(miniature.date_added()));

    if !miniature.recipe().is_empty() {
        println!("\n{}\n{}", "Paint Recipe".bold(), miniature.recipe());
    }
    if !miniature.notes().is_empty() {
        println!("\n{}\n{}", "Notes".bold(), miniature.notes());
    }

    let photos = miniature.photos_by_date();
    if !photos.is_empty() {
        let cover = miniature.cover_photo().map(|p| p.id());
        println!("\n{}", "Photos".bold());
        for photo in photos {
            let marker = if Some(photo.id()) == cover {
                " (cover)"
            } else {
                ""
            };
            println!(
                "  {}  {}  {} bytes{}",
                render::short_id(photo.id()).as_str().dimmed(),
                render::date(photo.date_taken()),
                photo.data().len(),
                marker
            );
        }
    }
}
