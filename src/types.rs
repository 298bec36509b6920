use serde::{Deserialize, Serialize};

/// One spreadsheet cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<&String> for Cell {
    fn from(value: &String) -> Self {
        Cell::Text(value.clone())
    }
}

impl From<u16> for Cell {
    fn from(value: u16) -> Self {
        Cell::Number(f64::from(value))
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Cell::Number(f64::from(value))
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

/// A flat record that can be written as one spreadsheet row.
///
/// `HEADERS` is the documented column order; `cells` must return exactly
/// one value per header in the same order.
pub trait SheetRow {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<Cell>;

    /// URL of the thumbnail shown in the trailing image column, if any.
    fn image_url(&self) -> Option<&str> {
        None
    }
}

/// Cannes official selection entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRecord {
    pub year: u16,
    pub edition: u32,
    pub category: String,
    pub subject: String,
    pub credit: String,
    pub link: String,
    pub image: String,
}

impl SheetRow for SelectionRecord {
    const HEADERS: &'static [&'static str] =
        &["year", "edition", "category", "subject", "credit", "link", "image"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.year.into(),
            self.edition.into(),
            (&self.category).into(),
            (&self.subject).into(),
            (&self.credit).into(),
            (&self.link).into(),
            (&self.image).into(),
        ]
    }
}

/// Cannes award: a selection entry plus its award tier label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardRecord {
    pub year: u16,
    pub edition: u32,
    pub category: String,
    pub subject: String,
    pub credit: String,
    pub award: String,
    pub link: String,
    pub image: String,
}

impl SheetRow for AwardRecord {
    const HEADERS: &'static [&'static str] = &[
        "year", "edition", "category", "subject", "credit", "award", "link", "image",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.year.into(),
            self.edition.into(),
            (&self.category).into(),
            (&self.subject).into(),
            (&self.credit).into(),
            (&self.award).into(),
            (&self.link).into(),
            (&self.image).into(),
        ]
    }
}

/// Oscars honoree; `win` separates winners from nominees
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CeremonyRecord {
    pub year: u16,
    pub edition: u32,
    pub category: String,
    pub subject: String,
    pub credit: String,
    pub win: bool,
}

impl SheetRow for CeremonyRecord {
    const HEADERS: &'static [&'static str] =
        &["year", "edition", "category", "subject", "credit", "win"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.year.into(),
            self.edition.into(),
            (&self.category).into(),
            (&self.subject).into(),
            (&self.credit).into(),
            self.win.into(),
        ]
    }
}

/// GRAMMY nomination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NominationRecord {
    pub year: u16,
    pub edition: u32,
    pub award: String,
    pub subject: String,
    pub credit: String,
    pub details: String,
    pub win: bool,
    pub order: u32,
    pub avatar: String,
}

impl SheetRow for NominationRecord {
    const HEADERS: &'static [&'static str] = &[
        "year", "edition", "award", "subject", "credit", "details", "win", "order", "avatar",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.year.into(),
            self.edition.into(),
            (&self.award).into(),
            (&self.subject).into(),
            (&self.credit).into(),
            (&self.details).into(),
            self.win.into(),
            self.order.into(),
            (&self.avatar).into(),
        ]
    }

    fn image_url(&self) -> Option<&str> {
        Some(self.avatar.as_str())
    }
}

/// Ranked album from a magazine list. `rank` and `year` stay text: the
/// source formats them and they must survive a CSV round trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub rank: String,
    pub cover: String,
    pub artist: String,
    pub album: String,
    pub caption: String,
    pub label: String,
    pub year: String,
    pub description: String,
}

impl SheetRow for ChartEntry {
    const HEADERS: &'static [&'static str] = &[
        "rank", "cover", "artist", "album", "caption", "label", "year", "description",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            (&self.rank).into(),
            (&self.cover).into(),
            (&self.artist).into(),
            (&self.album).into(),
            (&self.caption).into(),
            (&self.label).into(),
            (&self.year).into(),
            (&self.description).into(),
        ]
    }
}

/// Douban Top 250 movie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub rank: u32,
    pub link: String,
    pub image: String,
    pub title: String,
    pub foreign_title: String,
    pub rating: String,
    pub votes: String,
    pub quote: String,
    pub credits: String,
    pub year: String,
    pub country: String,
    pub genre: String,
}

impl SheetRow for MovieRecord {
    const HEADERS: &'static [&'static str] = &[
        "rank",
        "link",
        "image",
        "title",
        "foreign_title",
        "rating",
        "votes",
        "quote",
        "credits",
        "year",
        "country",
        "genre",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.rank.into(),
            (&self.link).into(),
            (&self.image).into(),
            (&self.title).into(),
            (&self.foreign_title).into(),
            (&self.rating).into(),
            (&self.votes).into(),
            (&self.quote).into(),
            (&self.credits).into(),
            (&self.year).into(),
            (&self.country).into(),
            (&self.genre).into(),
        ]
    }
}
