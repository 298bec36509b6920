use anyhow::{Context, Result};
use chrono::Datelike;
use tracing::info;

use crate::config::{year_url, OscarsConfig};
use crate::error::ScrapeResult;
use crate::net::PageSource;
use crate::period::Period;
use crate::pipeline::{self, FieldRule, FieldSpec, PageLayout};
use crate::storage::CachedSource;
use crate::types::CeremonyRecord;

const WINNER_LABEL: &str = "Winner";

/// Ceremony page: one section per category, one item per honoree.
pub fn layout() -> PageLayout {
    PageLayout {
        root: "#tabSectionsContent .field--name-field-award-categories".to_string(),
        section: "div.field__item".to_string(),
        title: FieldRule::text(".field--name-field-award-category-oscars"),
        subtitle: None,
        item: ".field--name-field-award-honorees div.field__item".to_string(),
        fields: vec![
            FieldSpec::new(
                "honoree_type",
                FieldRule::text(".field--name-field-honoree-type").optional(),
            ),
            FieldSpec::new("subject", FieldRule::text("div.field__item")),
            FieldSpec::new("credit", FieldRule::text("div.field__item").nth(1).optional()),
        ],
    }
}

pub fn parse_ceremony(html: &str, period: Period, layout: &PageLayout) -> ScrapeResult<Vec<CeremonyRecord>> {
    info!("Welcome to the {} - {}th Oscars!", period.year, period.edition);

    let mut records = Vec::new();
    for item in pipeline::extract(html, layout, period)? {
        let record = CeremonyRecord {
            year: item.period.year,
            edition: item.period.edition,
            subject: item.field("subject")?.to_string(),
            credit: item.field("credit")?.to_string(),
            win: item.field("honoree_type")? == WINNER_LABEL,
            category: item.section,
        };

        info!(
            "{}th {}: {} - {} ({})",
            record.edition,
            record.category,
            record.subject,
            record.credit,
            if record.win { "Winner" } else { "Nominee" }
        );
        records.push(record);
    }

    Ok(records)
}

pub fn page_key(year: u16) -> String {
    format!("oscars-of-{}.html", year)
}

/// Ceremonies from the newest configured year down to the first, one page
/// at a time.
pub fn run<S: PageSource>(config: &OscarsConfig, source: &CachedSource<'_, S>) -> Result<Vec<CeremonyRecord>> {
    let to_year = config
        .to_year
        .unwrap_or_else(|| chrono::Utc::now().year() as u16);
    let from_year = config.from_year.unwrap_or(config.calendar.base_year);

    let mut records = Vec::new();
    for year in config.calendar.years(from_year, to_year).into_iter().rev() {
        let period = config.calendar.period(year)?;
        let page = source
            .page(&page_key(year), &year_url(&config.url, year))
            .with_context(|| format!("Failed to load Oscars {}", year))?;
        let mut ceremony = parse_ceremony(&page, period, &config.layout)
            .with_context(|| format!("Failed to parse Oscars {}", year))?;
        records.append(&mut ceremony);
    }

    Ok(records)
}
