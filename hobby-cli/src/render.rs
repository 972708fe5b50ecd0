use chrono::{DateTime, Local, Utc};
use colored::{ColoredString, Colorize};
use hobby_lib::{
    Repository,
    repository::{Miniature, Photo, Status},
};
use uuid::Uuid;

use crate::Failure;

/// How many characters of an id are shown in listings
const SHORT_ID_LEN: usize = 8;

pub fn short_id(id: Uuid) -> String {
    id.simple().to_string().chars().take(SHORT_ID_LEN).collect()
}

pub fn status(status: Status) -> ColoredString {
    let label = status.display_name();
    let label = label.as_str();
    match status {
        Status::Unbuilt => label.bright_black(),
        Status::Built => label.truecolor(150, 95, 40),
        Status::Primed => label.black().on_bright_white(),
        Status::Wip => label.blue(),
        Status::Complete => label.green(),
    }
}

pub fn date(date: DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%e %b %Y").to_string()
}

pub fn row(miniature: &Miniature) -> String {
    let photos = match miniature.photos().len() {
        0 => String::new(),
        1 => "1 photo".dimmed().to_string(),
        n => format!("{n} photos").as_str().dimmed().to_string(),
    };

    format!(
        "{}  {}  {}  {}  {}",
        short_id(miniature.id()).as_str().dimmed(),
        miniature.name().bold(),
        miniature.faction(),
        status(miniature.status()),
        photos
    )
}

/// Find the miniature an id (or the start of one) on the command line refers to.
pub fn resolve(repo: &Repository, id: &str) -> Result<Miniature, Failure> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        return Ok(repo.miniature(uuid)?);
    }

    let mut matches = repo
        .miniatures()?
        .into_iter()
        .filter(|m| m.id().simple().to_string().starts_with(&id.to_lowercase()));

    match (matches.next(), matches.next()) {
        (Some(found), None) => Ok(found),
        (None, _) => Err(Failure::Missing(format!("No miniature matches '{id}'"))),
        (Some(_), Some(_)) => Err(Failure::Usage(format!(
            "'{id}' matches more than one miniature, use more of the id"
        ))),
    }
}

/// Find the photo an id (or the start of one) on the command line refers to.
pub fn resolve_photo(repo: &Repository, id: &str) -> Result<Photo, Failure> {
    let prefix = match Uuid::parse_str(id) {
        Ok(uuid) => uuid.simple().to_string(),
        Err(_) => id.to_lowercase(),
    };

    let mut matches = repo
        .miniatures()?
        .into_iter()
        .flat_map(|m| m.photos().to_vec())
        .filter(|p| p.id().simple().to_string().starts_with(&prefix));

    match (matches.next(), matches.next()) {
        (Some(found), None) => Ok(found),
        (None, _) => Err(Failure::Missing(format!("No photo matches '{id}'"))),
        (Some(_), Some(_)) => Err(Failure::Usage(format!(
            "'{id}' matches more than one photo, use more of the id"
        ))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_short_id() {
        let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();

        assert_eq!(short_id(id), "67e55044");
    }
}
