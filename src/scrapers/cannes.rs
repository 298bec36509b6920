use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::info;

use crate::config::{year_url, CannesConfig};
use crate::error::ScrapeResult;
use crate::net::PageSource;
use crate::normalize::TextRule;
use crate::period::Period;
use crate::pipeline::{self, FieldRule, FieldSpec, PageLayout};
use crate::storage::CachedSource;
use crate::types::{AwardRecord, SelectionRecord};

/// French connector words that prefix credits ("de Bong Joon Ho", "pour Anora")
const CONNECTOR_WORDS: &[&str] = &["de", "pour"];

fn connector_words() -> Vec<String> {
    CONNECTOR_WORDS.iter().map(|w| w.to_string()).collect()
}

fn base_layout(fields: Vec<FieldSpec>) -> PageLayout {
    PageLayout {
        root: "main".to_string(),
        section: ".section".to_string(),
        title: FieldRule::text(".container__inner h2"),
        subtitle: Some(FieldRule::text(".container__inner h3").optional()),
        item: ".container__inner div.list_container div.list_item".to_string(),
        fields,
    }
}

/// Official selection page: one item per selected film.
pub fn selection_layout() -> PageLayout {
    base_layout(vec![
        // the site lazy-loads images; `src` is only a placeholder
        FieldSpec::new("image", FieldRule::attr(None, "data-over-src")),
        FieldSpec::new("link", FieldRule::attr(Some("div.list_item__content a"), "href")),
        FieldSpec::new("subject", FieldRule::text("div.list_item__content a")),
        FieldSpec::new(
            "credit",
            FieldRule::text("div.list_item__content span")
                .optional()
                .with_text(TextRule {
                    collapse_whitespace: true,
                    leading_words: connector_words(),
                    strip_leading_dashes: true,
                    trim_end: Some(". ".to_string()),
                    ..TextRule::default()
                }),
        ),
    ])
}

/// Awards page: like the selection, plus the prize label of each item.
pub fn awards_layout() -> PageLayout {
    base_layout(vec![
        FieldSpec::new("image", FieldRule::attr(None, "data-over-src")),
        FieldSpec::new("link", FieldRule::attr(Some("div.list_item__content a"), "href")),
        FieldSpec::new(
            "award",
            FieldRule::text("div.list_item__content div.list_item__award"),
        ),
        FieldSpec::new("subject", FieldRule::text("div.list_item__content div.block a")),
        FieldSpec::new(
            "credit",
            FieldRule::text("div.list_item__content div.block span")
                .optional()
                .with_text(TextRule {
                    collapse_whitespace: true,
                    leading_words: connector_words(),
                    ..TextRule::default()
                }),
        ),
    ])
}

pub fn parse_selection(html: &str, period: Period, layout: &PageLayout) -> ScrapeResult<Vec<SelectionRecord>> {
    pipeline::extract(html, layout, period)?
        .into_iter()
        .map(|item| {
            Ok(SelectionRecord {
                year: item.period.year,
                edition: item.period.edition,
                subject: item.field("subject")?.to_string(),
                credit: item.field("credit")?.to_string(),
                link: item.field("link")?.to_string(),
                image: item.field("image")?.to_string(),
                category: item.section,
            })
        })
        .collect()
}

pub fn parse_awards(html: &str, period: Period, layout: &PageLayout) -> ScrapeResult<Vec<AwardRecord>> {
    let mut records = Vec::new();

    for item in pipeline::extract(html, layout, period)? {
        let record = AwardRecord {
            year: item.period.year,
            edition: item.period.edition,
            subject: item.field("subject")?.to_string(),
            credit: item.field("credit")?.to_string(),
            award: item.field("award")?.to_string(),
            link: item.field("link")?.to_string(),
            image: item.field("image")?.to_string(),
            category: item.section,
        };

        info!(
            "{} - {}th {} - {}: {} - {}",
            record.year, record.edition, record.category, record.award, record.subject, record.credit
        );
        records.push(record);
    }

    Ok(records)
}

pub fn awards_key(year: u16) -> String {
    format!("cannes-of-{}-awards.html", year)
}

pub fn selection_key(year: u16) -> String {
    format!("cannes-of-{}-selection.html", year)
}

/// Awards and selection records of one festival year
#[derive(Debug, Default)]
pub struct CannesYear {
    pub awards: Vec<AwardRecord>,
    pub selection: Vec<SelectionRecord>,
}

pub fn scrape_year<S: PageSource>(
    source: &CachedSource<'_, S>,
    config: &CannesConfig,
    year: u16,
) -> ScrapeResult<CannesYear> {
    let period = config.calendar.period(year)?;

    let awards_page = source.page(&awards_key(year), &year_url(&config.awards_url, year))?;
    let awards = parse_awards(&awards_page, period, &config.awards_layout)?;

    let selection_page = source.page(&selection_key(year), &year_url(&config.selection_url, year))?;
    let selection = parse_selection(&selection_page, period, &config.selection_layout)?;

    Ok(CannesYear { awards, selection })
}

/// Scrape every held year in the configured range on a worker pool.
///
/// Workers share nothing but the read-only source; results are merged after
/// the pool finishes and ordered by year, newest first.
pub fn run<S: PageSource>(config: &CannesConfig, source: &CachedSource<'_, S>) -> Result<CannesYear> {
    let years = config.calendar.years(config.from_year, config.to_year);
    info!("Scraping {} Cannes festival years", years.len());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads.unwrap_or(0))
        .build()
        .context("Failed to build worker pool")?;

    let per_year: Vec<(u16, ScrapeResult<CannesYear>)> = pool.install(|| {
        years
            .par_iter()
            .map(|&year| (year, scrape_year(source, config, year)))
            .collect()
    });

    let mut all = CannesYear::default();
    for (year, result) in per_year {
        let mut scraped = result.with_context(|| format!("Failed to scrape Cannes {}", year))?;
        all.awards.append(&mut scraped.awards);
        all.selection.append(&mut scraped.selection);
    }

    sort_newest_first(&mut all);
    Ok(all)
}

/// Stable, so records keep page order within a year.
pub fn sort_newest_first(results: &mut CannesYear) {
    results.awards.sort_by(|a, b| b.year.cmp(&a.year));
    results.selection.sort_by(|a, b| b.year.cmp(&a.year));
}
