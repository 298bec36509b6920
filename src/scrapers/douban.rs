//! Douban movie Top 250.
//!
//! Every list page holds `page_size` `div.item` blocks. Fields are read from
//! each block's DOM; only the credits paragraph is split with a regex.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::info;

use crate::config::DoubanConfig;
use crate::error::{ScrapeError, ScrapeResult};
use crate::net::PageSource;
use crate::storage::CachedSource;
use crate::types::MovieRecord;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid douban selector")
}

static ITEM: Lazy<Selector> = Lazy::new(|| selector("div.item"));
static RANK: Lazy<Selector> = Lazy::new(|| selector("div.pic em"));
static LINK: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static IMAGE: Lazy<Selector> = Lazy::new(|| selector("img[src]"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("span.title"));
static RATING: Lazy<Selector> = Lazy::new(|| selector("span.rating_num"));
static STAR_SPAN: Lazy<Selector> = Lazy::new(|| selector("div.star span"));
static QUOTE: Lazy<Selector> = Lazy::new(|| selector("span.inq"));
static CREDITS_BLOCK: Lazy<Selector> = Lazy::new(|| selector("div.bd p"));

static VOTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)人评价$").expect("valid votes regex"));
/// "credits<br>year / country / genre"; extra slashes in the year part are absorbed
static CREDITS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*(.+?)<br>\s*(\d{4}).*/\s*(.+?)\s*/\s*(.+)").expect("valid credits regex")
});

fn clean(text: &str) -> String {
    text.replace('\u{a0}', " ").trim().to_string()
}

fn missing(selector: &str, rank: &str) -> ScrapeError {
    ScrapeError::MissingElement {
        selector: selector.to_string(),
        context: format!("movie {}", rank),
    }
}

fn text_of(item: ElementRef<'_>, selector: &Selector, label: &str, rank: &str) -> ScrapeResult<String> {
    item.select(selector)
        .next()
        .map(|el| clean(&el.text().collect::<String>()))
        .ok_or_else(|| missing(label, rank))
}

fn attr_of(item: ElementRef<'_>, selector: &Selector, label: &str, attr: &str) -> ScrapeResult<String> {
    item.select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
        .ok_or_else(|| ScrapeError::MissingAttribute {
            attr: attr.to_string(),
            selector: label.to_string(),
        })
}

/// Text of the credits paragraph with its line breaks kept as `<br>`.
fn credits_text(paragraph: ElementRef<'_>) -> String {
    let mut text = String::new();
    for child in paragraph.children() {
        match child.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(e) if e.name() == "br" => text.push_str("<br>"),
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    text.extend(el.text());
                }
            }
            _ => {}
        }
    }
    text.replace('\u{a0}', " ")
}

fn parse_item(item: ElementRef<'_>) -> ScrapeResult<MovieRecord> {
    let rank_text = text_of(item, &RANK, "div.pic em", "?")?;
    let rank = rank_text
        .parse::<u32>()
        .map_err(|_| ScrapeError::MissingField(format!("rank `{}`", rank_text)))?;

    // some movies only have a Chinese title
    let titles: Vec<String> = item
        .select(&TITLE)
        .map(|el| clean(&el.text().collect::<String>()))
        .collect();
    let title = titles
        .first()
        .cloned()
        .ok_or_else(|| missing("span.title", &rank_text))?;
    let foreign_title = titles
        .get(1)
        .map(|t| t.replace('/', "").trim().to_string())
        .unwrap_or_default();

    let votes = item
        .select(&STAR_SPAN)
        .map(|el| clean(&el.text().collect::<String>()))
        .find_map(|text| VOTES.captures(&text).map(|caps| caps[1].to_string()))
        .ok_or_else(|| ScrapeError::PatternMiss {
            pattern: VOTES.as_str().to_string(),
            context: format!("votes of movie {}", rank),
        })?;

    let quote = item
        .select(&QUOTE)
        .next()
        .map(|el| clean(&el.text().collect::<String>()).replace('。', ""))
        .unwrap_or_default();

    let paragraph = item
        .select(&CREDITS_BLOCK)
        .next()
        .ok_or_else(|| missing("div.bd p", &rank_text))?;
    let block = credits_text(paragraph);
    let line = CREDITS_LINE
        .captures(&block)
        .ok_or_else(|| ScrapeError::PatternMiss {
            pattern: CREDITS_LINE.as_str().to_string(),
            context: format!("credits of movie {}", rank),
        })?;
    let group = |i: usize| line[i].trim().to_string();

    Ok(MovieRecord {
        rank,
        link: attr_of(item, &LINK, "a[href]", "href")?,
        image: attr_of(item, &IMAGE, "img[src]", "src")?,
        title,
        foreign_title,
        rating: text_of(item, &RATING, "span.rating_num", &rank_text)?,
        votes,
        quote,
        credits: group(1),
        year: group(2),
        country: group(3),
        genre: group(4),
    })
}

pub fn parse_page(html: &str) -> ScrapeResult<Vec<MovieRecord>> {
    let document = Html::parse_document(html);
    document.select(&ITEM).map(parse_item).collect()
}

pub fn page_key(start: u32) -> String {
    format!("douban-top250-{}.html", start)
}

/// Every list page in order, then ranked.
pub fn run<S: PageSource>(config: &DoubanConfig, source: &CachedSource<'_, S>) -> Result<Vec<MovieRecord>> {
    let mut movies = Vec::new();

    for page in 0..config.pages {
        let start = page * config.page_size;
        let url = format!("{}{}", config.base_url, start);

        let html = source
            .page(&page_key(start), &url)
            .with_context(|| format!("Failed to load {}", url))?;
        let mut parsed = parse_page(&html).with_context(|| format!("Failed to parse {}", url))?;

        info!("Page {}: {} movies", page + 1, parsed.len());
        movies.append(&mut parsed);
    }

    movies.sort_by_key(|m| m.rank);
    Ok(movies)
}
