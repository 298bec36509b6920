//! Year ↔ edition arithmetic for yearly events.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ScrapeError, ScrapeResult};

static ORDINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid ordinal regex"));

/// The period every extracted record is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub year: u16,
    pub edition: u32,
}

/// Maps calendar years to edition numbers for an event held yearly since
/// `base_year`, except for `excluded_years` in which it was not held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditionCalendar {
    pub base_year: u16,
    #[serde(default)]
    pub excluded_years: Vec<u16>,
}

impl EditionCalendar {
    pub fn new(base_year: u16, excluded_years: Vec<u16>) -> Self {
        Self {
            base_year,
            excluded_years,
        }
    }

    pub fn is_held(&self, year: u16) -> bool {
        year >= self.base_year && !self.excluded_years.contains(&year)
    }

    /// `year - base_year + 1`, minus the cancelled years that came before.
    pub fn edition(&self, year: u16) -> ScrapeResult<u32> {
        if year < self.base_year {
            return Err(ScrapeError::Period(format!(
                "{} precedes the first edition ({})",
                year, self.base_year
            )));
        }
        if self.excluded_years.contains(&year) {
            return Err(ScrapeError::Period(format!("no edition was held in {}", year)));
        }

        let skipped = self
            .excluded_years
            .iter()
            .filter(|&&y| y >= self.base_year && y < year)
            .count() as u32;

        Ok(u32::from(year - self.base_year) + 1 - skipped)
    }

    pub fn period(&self, year: u16) -> ScrapeResult<Period> {
        Ok(Period {
            year,
            edition: self.edition(year)?,
        })
    }

    /// Held years within `from..=to`, ascending.
    pub fn years(&self, from: u16, to: u16) -> Vec<u16> {
        (from.max(self.base_year)..=to)
            .filter(|&y| self.is_held(y))
            .collect()
    }
}

/// First integer in an ordinal title, e.g. "67th Annual GRAMMY Awards" → 67.
pub fn ordinal_number(title: &str) -> ScrapeResult<u32> {
    let found = ORDINAL.find(title).ok_or_else(|| ScrapeError::PatternMiss {
        pattern: ORDINAL.as_str().to_string(),
        context: format!("title `{}`", title),
    })?;

    found
        .as_str()
        .parse::<u32>()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| ScrapeError::Period(format!("`{}` is not a valid edition", found.as_str())))
}
