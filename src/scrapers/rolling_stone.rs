//! Rolling Stone "500 Greatest Albums" galleries.
//!
//! Each list page carries its entries as a JSON object assigned to
//! `pmcGalleryExports` inside the `#pmc-lists-front-js-extra` script, along
//! with the link to the next page of the gallery.

use std::collections::HashSet;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use serde_json::Value;
use tracing::info;

use crate::config::RollingStoneConfig;
use crate::error::{ScrapeError, ScrapeResult};
use crate::net::PageSource;
use crate::normalize::{decode_entities, split_pair, strip_tags};
use crate::pipeline::parse_selector;
use crate::scrapers::{json_array, json_at, json_opt_str, json_str};
use crate::storage::CachedSource;
use crate::types::ChartEntry;

const PAYLOAD_SCRIPT: &str = "#pmc-lists-front-js-extra";

static PAYLOAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"var pmcGalleryExports = (.*);").expect("valid payload regex"));
static PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(<p.*?>.*?</p>)").expect("valid paragraph regex"));
static PARAGRAPH_BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<p.*?>(.*?)</p>").expect("valid paragraph regex"));
static LABEL_PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<p><em>(.*?)</em></p>").expect("valid label regex"));

/// Entities and odd spacing the script node carries around the payload
const SCRIPT_REPLACEMENTS: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&#8216;", "‘"),
    ("&#8217;", "’"),
    ("&#8230;", "…"),
    ("\u{2008}", " "),
];

/// "Artist, Album" separators, most common first
pub const ARTIST_DELIMITERS: &[&str] = &[", ", " ,", "’ "];
/// "Label, Year" separators of the 2023 list subtitles
pub const SUBTITLE_DELIMITERS: &[&str] = &[", ", " ", ",,"];
/// "Label, Year" separator of the 2003 list's leading description paragraph
pub const LABEL_PARAGRAPH_DELIMITERS: &[&str] = &[", "];

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ListEdition {
    #[value(name = "2003")]
    List2003,
    #[value(name = "2023")]
    List2023,
}

impl ListEdition {
    pub fn url<'a>(&self, config: &'a RollingStoneConfig) -> &'a str {
        match self {
            ListEdition::List2003 => &config.list_2003_url,
            ListEdition::List2023 => &config.list_2023_url,
        }
    }

    pub fn output<'a>(&self, config: &'a RollingStoneConfig) -> &'a str {
        match self {
            ListEdition::List2003 => &config.list_2003_output,
            ListEdition::List2023 => &config.list_2023_output,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ListEdition::List2003 => "2003",
            ListEdition::List2023 => "2023",
        }
    }
}

/// Entries of one gallery page plus the link to the next page, if any.
#[derive(Debug)]
pub struct GalleryPage {
    pub entries: Vec<ChartEntry>,
    pub next: Option<String>,
}

/// Isolate and decode the `pmcGalleryExports` object of a list page.
pub fn gallery_payload(html: &str) -> ScrapeResult<Value> {
    let document = Html::parse_document(html);
    let selector = parse_selector(PAYLOAD_SCRIPT)?;
    let script = document
        .select(&selector)
        .next()
        .ok_or_else(|| ScrapeError::MissingElement {
            selector: PAYLOAD_SCRIPT.to_string(),
            context: "gallery page".to_string(),
        })?;

    let mut text = script.text().collect::<String>().trim().to_string();
    for (from, to) in SCRIPT_REPLACEMENTS {
        text = text.replace(from, to);
    }

    let captures = PAYLOAD.captures(&text).ok_or_else(|| ScrapeError::PatternMiss {
        pattern: PAYLOAD.as_str().to_string(),
        context: format!("`{}` script", PAYLOAD_SCRIPT),
    })?;

    Ok(serde_json::from_str(&captures[1])?)
}

/// A scalar field as text; the site emits ranks both as strings and numbers.
fn json_text(item: &Value, path: &str) -> ScrapeResult<String> {
    match json_at(item, path)? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(ScrapeError::MissingField(format!("{} (expected text)", path))),
    }
}

fn strip_html(text: &str) -> String {
    decode_entities(&strip_tags(text.trim()))
}

/// Split "Artist, Album" and drop the curly quotes wrapping the album.
pub fn artist_and_album(title: &str) -> ScrapeResult<(String, String)> {
    let cleaned = strip_tags(&title.replace('\u{feff}', ""));
    let (artist, album) = split_pair(&cleaned, ARTIST_DELIMITERS)?;
    let album = album.trim_matches('‘').trim_matches('’').to_string();
    Ok((artist, album))
}

/// 2003 list: label and year come from a leading `<p><em>Label, Year</em></p>`
/// paragraph; the remaining paragraphs form the description.
fn describe_2003(description: &str) -> ScrapeResult<(String, String, String)> {
    let parts: Vec<&str> = PARAGRAPH
        .captures_iter(description)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    let first = parts
        .first()
        .ok_or_else(|| ScrapeError::MissingField("description (no paragraphs)".to_string()))?;

    match LABEL_PARAGRAPH.captures(first) {
        Some(caps) => {
            let (label, year) = split_pair(&caps[1], LABEL_PARAGRAPH_DELIMITERS)?;
            Ok((label, year, strip_html(&parts[1..].join("\n"))))
        }
        None => Ok((String::new(), String::new(), strip_html(&parts.join("\n")))),
    }
}

fn parse_entry(item: &Value, edition: ListEdition) -> ScrapeResult<ChartEntry> {
    let cover = json_str(item, "image")?
        .split('?')
        .next()
        .unwrap_or_default()
        .to_string();
    let rank = json_text(item, "positionDisplay")?;
    let (artist, album) = artist_and_album(json_str(item, "title")?)?;
    let caption = json_opt_str(item, "caption")?.unwrap_or_default().to_string();
    let description = json_str(item, "description")?;

    let (label, year, description) = match edition {
        ListEdition::List2003 => describe_2003(description)?,
        ListEdition::List2023 => {
            // additionalSubtitle is only read when subtitle is unusable
            let subtitle = match json_opt_str(item, "subtitle")?.filter(|s| !s.is_empty()) {
                Some(subtitle) => subtitle,
                None => json_opt_str(item, "additionalSubtitle")?
                    .ok_or_else(|| ScrapeError::MissingField("subtitle".to_string()))?,
            };
            let (label, year) = split_pair(subtitle, SUBTITLE_DELIMITERS)?;

            let paragraphs: Vec<&str> = PARAGRAPH_BODY
                .captures_iter(description)
                .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
                .collect();
            (label, year, strip_html(&paragraphs.join("\n")))
        }
    };

    Ok(ChartEntry {
        rank,
        cover,
        artist,
        album,
        caption,
        label,
        year,
        description,
    })
}

pub fn parse_gallery_page(html: &str, edition: ListEdition) -> ScrapeResult<GalleryPage> {
    let payload = gallery_payload(html)?;

    let entries = json_array(&payload, "gallery")?
        .iter()
        .map(|item| parse_entry(item, edition))
        .collect::<ScrapeResult<Vec<_>>>()?;

    let next = json_opt_str(&payload, "nextPageLink")?
        .filter(|link| !link.is_empty())
        .map(str::to_string);

    Ok(GalleryPage { entries, next })
}

pub fn page_key(edition: ListEdition, page: usize) -> String {
    format!("rollingstone-{}-page-{}.html", edition.label(), page)
}

/// Follow `nextPageLink` from the first page until the gallery ends.
pub fn run<S: PageSource>(
    config: &RollingStoneConfig,
    edition: ListEdition,
    source: &CachedSource<'_, S>,
) -> Result<Vec<ChartEntry>> {
    let mut entries = Vec::new();
    let mut visited = HashSet::new();
    let mut link = Some(edition.url(config).to_string());
    let mut page = 1;

    while let Some(url) = link {
        if !visited.insert(url.clone()) {
            return Err(ScrapeError::Pagination(url).into());
        }

        info!("Crawling {} ...", url);
        let html = source
            .page(&page_key(edition, page), &url)
            .with_context(|| format!("Failed to load {}", url))?;
        let mut gallery =
            parse_gallery_page(&html, edition).with_context(|| format!("Failed to parse {}", url))?;

        entries.append(&mut gallery.entries);
        link = gallery.next;
        page += 1;
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page_html(payload: &Value) -> String {
        format!(
            r#"<html><body><script id="pmc-lists-front-js-extra">
/* <![CDATA[ */
var pmcGalleryExports = {};
/* ]]> */
</script></body></html>"#,
            payload
        )
    }

    #[test]
    fn test_artist_and_album_fallback_chain() {
        assert_eq!(
            artist_and_album("The Beatles, ‘Abbey Road’").unwrap(),
            ("The Beatles".to_string(), "Abbey Road".to_string())
        );
        assert_eq!(
            artist_and_album("\u{feff}<em>Grand Funk’ We’re An American Band</em>").unwrap(),
            ("Grand Funk".to_string(), "We’re An American Band".to_string())
        );
        assert!(artist_and_album("Untitled").is_err());
    }

    #[test]
    fn test_parse_2023_entry() {
        let payload = json!({
            "gallery": [{
                "image": "https://img/cover.jpg?w=300",
                "positionDisplay": "1",
                "title": "Marvin Gaye, ‘What’s Going On’",
                "subtitle": "Tamla, 1971",
                "description": "<p>Track one &amp; two.</p>\n<p class=\"x\">Second <b>paragraph</b>.</p>"
            }],
            "nextPageLink": ""
        });

        let gallery = parse_gallery_page(&page_html(&payload), ListEdition::List2023).unwrap();
        assert!(gallery.next.is_none());

        let entry = &gallery.entries[0];
        assert_eq!(entry.rank, "1");
        assert_eq!(entry.cover, "https://img/cover.jpg");
        assert_eq!(entry.artist, "Marvin Gaye");
        assert_eq!(entry.album, "What’s Going On");
        assert_eq!(entry.label, "Tamla");
        assert_eq!(entry.year, "1971");
        assert_eq!(entry.description, "Track one & two.\nSecond paragraph.");
    }

    #[test]
    fn test_2023_subtitle_fallbacks() {
        let payload = json!({
            "gallery": [{
                "image": "x.jpg", "positionDisplay": 2,
                "title": "Prince, Purple Rain",
                "subtitle": null,
                "additionalSubtitle": "Warner 1984",
                "description": "<p>Text</p>"
            }]
        });

        let gallery = parse_gallery_page(&page_html(&payload), ListEdition::List2023).unwrap();
        assert_eq!(gallery.entries[0].rank, "2");
        assert_eq!(gallery.entries[0].label, "Warner");
        assert_eq!(gallery.entries[0].year, "1984");
    }

    #[test]
    fn test_fallback_subtitle_not_read_when_subtitle_present() {
        let payload = json!({
            "gallery": [{
                "image": "x.jpg", "positionDisplay": "2",
                "title": "Prince, Purple Rain",
                "subtitle": "Warner, 1984",
                "additionalSubtitle": false,
                "description": "<p>Text</p>"
            }]
        });

        let gallery = parse_gallery_page(&page_html(&payload), ListEdition::List2023).unwrap();
        assert_eq!(gallery.entries[0].label, "Warner");
        assert_eq!(gallery.entries[0].year, "1984");
    }

    #[test]
    fn test_artist_delimiters_keep_their_order() {
        // ", " wins over "’ " even when the apostrophe comes first
        assert_eq!(
            split_pair("A’ B, C", ARTIST_DELIMITERS).unwrap(),
            ("A’ B".to_string(), "C".to_string())
        );
        // " ," wins over "’ "
        assert_eq!(
            split_pair("A’ B ,C", ARTIST_DELIMITERS).unwrap(),
            ("A’ B".to_string(), "C".to_string())
        );
    }

    #[test]
    fn test_subtitle_delimiters_keep_their_order() {
        // ", " wins over " " even though a space comes first
        assert_eq!(
            split_pair("Warner Bros, 1984", SUBTITLE_DELIMITERS).unwrap(),
            ("Warner Bros".to_string(), "1984".to_string())
        );
        assert_eq!(
            split_pair("Columbia 1967", SUBTITLE_DELIMITERS).unwrap(),
            ("Columbia".to_string(), "1967".to_string())
        );
    }

    #[test]
    fn test_unsplittable_subtitle_is_an_error() {
        let payload = json!({
            "gallery": [{
                "image": "x.jpg", "positionDisplay": "3",
                "title": "Prince, Purple Rain",
                "subtitle": "Warner",
                "description": "<p>Text</p>"
            }]
        });

        let err = parse_gallery_page(&page_html(&payload), ListEdition::List2023).unwrap_err();
        assert!(matches!(err, ScrapeError::Unsplittable { .. }));
    }

    #[test]
    fn test_parse_2003_entry() {
        let payload = json!({
            "gallery": [{
                "image": "https://img/pepper.jpg",
                "positionDisplay": "1",
                "title": "The Beatles, ‘Sgt. Pepper’s Lonely Hearts Club Band’",
                "caption": "Capitol",
                "description": "<p><em>Capitol, 1967</em></p>\n<p>First.</p>\n<p>It&#8217;s second.</p>"
            }],
            "nextPageLink": "https://www.rollingstone.com/list/page/2/"
        });

        let gallery = parse_gallery_page(&page_html(&payload), ListEdition::List2003).unwrap();
        assert_eq!(gallery.next.as_deref(), Some("https://www.rollingstone.com/list/page/2/"));

        let entry = &gallery.entries[0];
        assert_eq!(entry.album, "Sgt. Pepper’s Lonely Hearts Club Band");
        assert_eq!(entry.caption, "Capitol");
        assert_eq!(entry.label, "Capitol");
        assert_eq!(entry.year, "1967");
        assert_eq!(entry.description, "First.\nIt’s second.");
    }

    #[test]
    fn test_2003_without_label_paragraph() {
        let payload = json!({
            "gallery": [{
                "image": "x.jpg", "positionDisplay": "4",
                "title": "Bob Dylan, Blonde on Blonde",
                "description": "<p>Only text.</p>"
            }]
        });

        let gallery = parse_gallery_page(&page_html(&payload), ListEdition::List2003).unwrap();
        assert_eq!(gallery.entries[0].label, "");
        assert_eq!(gallery.entries[0].description, "Only text.");
    }

    #[test]
    fn test_missing_payload_is_a_pattern_miss() {
        let html = r#"<script id="pmc-lists-front-js-extra">var other = {};</script>"#;
        let err = gallery_payload(html).unwrap_err();
        assert!(matches!(err, ScrapeError::PatternMiss { .. }));
    }
}
