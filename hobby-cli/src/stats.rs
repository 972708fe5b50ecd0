use colored::Colorize;
use hobby_lib::Repository;

use crate::{Failure, render};

pub fn handle(repo: &Repository) -> Result<(), Failure> {
    let stats = repo.stats()?;

    println!("{} ({} miniatures)", "Project Status".bold(), stats.total);
    if stats.segments.is_empty() {
        println!("{}", "Add miniatures to see data here.".dimmed());
    }
    for segment in &stats.segments {
        println!(
            "  {:<24} {:>4}  {:>5.1}%",
            render::status(segment.status),
            segment.count,
            segment.fraction() * 100.0
        );
    }

    println!();
    println!("{}", "Faction Breakdown".bold());
    if stats.factions.is_empty() {
        println!("{}", "Add factions to see data here.".dimmed());
    }
    for faction in &stats.factions {
        let name = if faction.faction.is_empty() {
            "(no faction)"
        } else {
            faction.faction.as_str()
        };
        println!(
            "  {:<24} {} {}",
            name,
            "█".repeat(faction.count).as_str().cyan(),
            faction.count
        );
    }

    Ok(())
}
