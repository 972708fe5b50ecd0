//! Views derived from a snapshot of the collection.
//!
//! Nothing in here touches the database. Every function takes the miniatures it works on and
//! returns a new list of references into them, so callers can recompute a view whenever they
//! like.

use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::repository::entities::{Miniature, Status};

/// Orders a list of miniatures can be shown in.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Most recently added first
    #[default]
    #[strum(to_string = "Newest")]
    Newest,
    /// Least recently added first
    #[strum(to_string = "Oldest")]
    Oldest,
    /// By name, A to Z
    #[strum(to_string = "Name (A-Z)")]
    Alphabetical,
    /// By faction, A to Z
    #[strum(to_string = "Faction")]
    Faction,
}

/// The two halves of the collection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, ValueEnum)]
pub enum Shelf {
    /// Everything that still needs work
    #[default]
    Backlog,
    /// Finished miniatures
    Gallery,
}

impl Shelf {
    pub fn contains(&self, miniature: &Miniature) -> bool {
        match self {
            Shelf::Backlog => !miniature.status().is_complete(),
            Shelf::Gallery => miniature.status().is_complete(),
        }
    }
}

/// Split the collection into its backlog and its gallery, keeping the input order in both.
///
/// Every miniature ends up in exactly one of the two.
pub fn partition(all: &[Miniature]) -> (Vec<&Miniature>, Vec<&Miniature>) {
    all.iter().partition(|m| Shelf::Backlog.contains(m))
}

/// Keep the miniatures whose name or faction contains `query`.
///
/// Matching ignores case and accents, so "eldar" finds "Eldar Corsairs" and "cafe" finds "Café".
/// An empty query keeps everything. Whitespace is matched like any other character.
pub fn search<'a, I>(items: I, query: &str) -> Vec<&'a Miniature>
where
    I: IntoIterator<Item = &'a Miniature>,
{
    if query.is_empty() {
        return items.into_iter().collect();
    }

    let needle = fold(query);
    items
        .into_iter()
        .filter(|m| fold(m.name()).contains(&needle) || fold(m.faction()).contains(&needle))
        .collect()
}

/// Sort miniatures by `key`. Miniatures that compare equal keep their relative order.
pub fn sort(mut items: Vec<&Miniature>, key: SortKey) -> Vec<&Miniature> {
    match key {
        SortKey::Newest => items.sort_by(|a, b| b.date_added().cmp(&a.date_added())),
        SortKey::Oldest => items.sort_by_key(|m| m.date_added()),
        SortKey::Alphabetical => items.sort_by(|a, b| a.name().cmp(b.name())),
        SortKey::Faction => items.sort_by(|a, b| a.faction().cmp(b.faction())),
    }

    items
}

/// Lower case with diacritics stripped, for loose text matching.
fn fold(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// What a list screen asks for: which shelf, what was typed in the search box and how to order
/// the result.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct View {
    pub shelf: Shelf,
    pub query: String,
    pub sort: SortKey,
}

impl View {
    pub fn new(shelf: Shelf) -> Self {
        Self {
            shelf,
            ..Default::default()
        }
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    pub fn is_searching(&self) -> bool {
        !self.query.is_empty()
    }

    /// Pick the shelf, then search, then sort.
    pub fn apply<'a>(&self, all: &'a [Miniature]) -> Vec<&'a Miniature> {
        let shelved = all.iter().filter(|m| self.shelf.contains(m));
        sort(search(shelved, &self.query), self.sort)
    }
}

// Statistics

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactionCount {
    pub faction: String,
    pub count: usize,
}

/// How many miniatures each faction has, biggest army first.
///
/// Factions are grouped by exact name, so "Orks" and "orks" are counted separately. Factions
/// with the same count are ordered by name.
pub fn faction_breakdown(items: &[Miniature]) -> Vec<FactionCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for miniature in items {
        *counts.entry(miniature.faction()).or_default() += 1;
    }

    let mut breakdown: Vec<FactionCount> = counts
        .into_iter()
        .map(|(faction, count)| FactionCount {
            faction: faction.into(),
            count,
        })
        .collect();

    // Stable, so equal counts stay in name order
    breakdown.sort_by(|a, b| b.count.cmp(&a.count));

    breakdown
}

/// How many miniatures have each status. Every status is present, unused ones with a count of
/// zero.
pub fn status_counts(items: &[Miniature]) -> BTreeMap<Status, usize> {
    let mut counts: BTreeMap<Status, usize> = Status::iter().map(|s| (s, 0)).collect();
    for miniature in items {
        *counts.entry(miniature.status()).or_default() += 1;
    }

    counts
}

/// One slice of the status donut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSegment {
    pub status: Status,
    pub count: usize,
    pub total: usize,
}

impl StatusSegment {
    /// The share of the circle this segment covers, between 0 and 1.
    pub fn fraction(&self) -> f64 {
        let count = u32::try_from(self.count).unwrap_or(u32::MAX);
        let total = u32::try_from(self.total).unwrap_or(u32::MAX);
        if total == 0 {
            return 0.0;
        }

        f64::from(count) / f64::from(total)
    }
}

/// Donut slices for every status that has at least one miniature, in status order.
pub fn status_segments(items: &[Miniature]) -> Vec<StatusSegment> {
    let total = items.len();
    status_counts(items)
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(status, count)| StatusSegment {
            status,
            count,
            total,
        })
        .collect()
}

/// Everything the statistics screen shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub total: usize,
    pub status_counts: BTreeMap<Status, usize>,
    pub segments: Vec<StatusSegment>,
    pub factions: Vec<FactionCount>,
}

impl Stats {
    pub fn compute(items: &[Miniature]) -> Self {
        Self {
            total: items.len(),
            status_counts: status_counts(items),
            segments: status_segments(items),
            factions: faction_breakdown(items),
        }
    }
}
