use anyhow::{Context, Result};
use scraper::Html;
use serde_json::Value;
use tracing::info;

use crate::config::GrammyConfig;
use crate::error::{ScrapeError, ScrapeResult};
use crate::net::PageSource;
use crate::normalize::{
    decode_unicode_escapes, parenthesized, strip_backslashes, strip_markup, strip_wrapping,
};
use crate::period::ordinal_number;
use crate::pipeline::parse_selector;
use crate::scrapers::{json_array, json_at, json_opt_str, json_str};
use crate::storage::CachedSource;
use crate::types::NominationRecord;

const NEXT_DATA: &str = "script#__NEXT_DATA__";
const CEREMONY_PATH: &str = "props.pageProps.pageContent.getAwardsYears.hits.0";
const CEREMONY_LIST_PATH: &str = "props.pageProps.pageContent.getAwardsYearsList.hits";

/// Categories whose credit line lives in the nomination title
const TITLE_CREDITED: &[&str] = &["Best New Artist"];

/// Decode the Next.js data blob embedded in a ceremony page.
pub fn next_data(html: &str) -> ScrapeResult<Value> {
    let document = Html::parse_document(html);
    let selector = parse_selector(NEXT_DATA)?;
    let script = document
        .select(&selector)
        .next()
        .ok_or_else(|| ScrapeError::MissingElement {
            selector: NEXT_DATA.to_string(),
            context: "ceremony page".to_string(),
        })?;

    let text = script.text().collect::<String>();
    Ok(serde_json::from_str(&text)?)
}

/// Absolute URLs of every ceremony listed on the page.
pub fn ceremony_links(data: &Value, domain: &str) -> ScrapeResult<Vec<String>> {
    let domain = domain.trim_end_matches('/');
    json_array(data, CEREMONY_LIST_PATH)?
        .iter()
        .map(|hit| {
            let slug = json_str(hit, "slug")?;
            Ok(format!("{}/{}", domain, slug.trim_start_matches('/')))
        })
        .collect()
}

/// Credit line of a nomination: `displayLine2`, or the parenthesized part of
/// `displayLine3` when line 2 is blank. Tags and parentheses are removed.
fn credit_line(nomination: &Value, award: &str) -> ScrapeResult<String> {
    let line = if TITLE_CREDITED.contains(&award) {
        json_opt_str(nomination, "title")?
    } else {
        json_opt_str(nomination, "displayLine2")?
    };

    let raw = match line.filter(|l| !l.is_empty()) {
        Some(line) => line.to_string(),
        None => json_opt_str(nomination, "displayLine3")?
            .and_then(parenthesized)
            .unwrap_or_default(),
    };

    Ok(strip_markup(&decode_unicode_escapes(&raw)).replace(['(', ')'], ""))
}

fn avatar(nomination: &Value, default_avatar: &str) -> ScrapeResult<String> {
    let artist = json_at(nomination, "creditedArtists.0")?;
    let dam = match artist.get("tivoInfo").filter(|info| !info.is_null()) {
        Some(info) => json_opt_str(info, "damDynamic")?,
        None => None,
    };

    Ok(dam
        .filter(|url| !url.is_empty())
        .unwrap_or(default_avatar)
        .to_string())
}

/// Nominations of one ceremony, each category ordered by `nomineeOrder`.
pub fn parse_ceremony(data: &Value, config: &GrammyConfig) -> ScrapeResult<Vec<NominationRecord>> {
    let ceremony = json_at(data, CEREMONY_PATH)?;
    let edition = ordinal_number(json_str(ceremony, "title")?)?;
    let year = u16::try_from(u32::from(config.base_year) + edition)
        .map_err(|_| ScrapeError::Period(format!("edition {} is out of range", edition)))?;

    info!("Welcome to the {}th Annual GRAMMY Awards!", edition);

    let mut records = Vec::new();

    for category in json_array(ceremony, "categoryDetails")? {
        let award = json_str(category, "title.0.name")?;
        let mut nominations = Vec::new();
        let mut winner = String::new();

        for nomination in json_array(category, "nominations")? {
            let subject = strip_wrapping(&strip_backslashes(json_str(nomination, "displayLine1")?), '"')
                .replace(['\r', '\n'], "");
            let win = json_at(nomination, "isWinner")?
                .as_bool()
                .ok_or_else(|| ScrapeError::MissingField("isWinner".to_string()))?;
            let order = json_at(nomination, "nomineeOrder")?
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| ScrapeError::MissingField("nomineeOrder".to_string()))?;

            let credit = credit_line(nomination, award)?;
            let details = json_opt_str(nomination, "displayLine3")?
                .map(decode_unicode_escapes)
                .unwrap_or_default();

            if win {
                winner = if credit.is_empty() {
                    subject.clone()
                } else {
                    format!("{} - {}", subject, credit)
                };
            }

            nominations.push(NominationRecord {
                year,
                edition,
                award: award.to_string(),
                subject,
                credit,
                details,
                win,
                order,
                avatar: avatar(nomination, &config.default_avatar)?,
            });
        }

        info!("{}th {}: {}", edition, award, winner);

        nominations.sort_by_key(|n| n.order);
        records.append(&mut nominations);
    }

    Ok(records)
}

pub fn page_key(url: &str) -> String {
    let slug = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("index");
    format!("grammy-{}.html", slug)
}

/// Entry ceremony first, then every other listed ceremony in list order.
pub fn run<S: PageSource>(config: &GrammyConfig, source: &CachedSource<'_, S>) -> Result<Vec<NominationRecord>> {
    let load = |url: &str| -> Result<Value> {
        let page = source
            .page(&page_key(url), url)
            .with_context(|| format!("Failed to load {}", url))?;
        next_data(&page).with_context(|| format!("Failed to decode ceremony data of {}", url))
    };

    let entry = load(&config.entry_url)?;
    let mut records = parse_ceremony(&entry, config)
        .with_context(|| format!("Failed to parse {}", config.entry_url))?;

    let entry_url = config.entry_url.trim_end_matches('/');
    for link in ceremony_links(&entry, &config.domain)? {
        if link.trim_end_matches('/') == entry_url {
            continue;
        }
        let data = load(&link)?;
        let mut ceremony = parse_ceremony(&data, config).with_context(|| format!("Failed to parse {}", link))?;
        records.append(&mut ceremony);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nomination(line1: &str, line2: Value, line3: Value, order: u64, win: bool) -> Value {
        json!({
            "displayLine1": line1,
            "displayLine2": line2,
            "displayLine3": line3,
            "title": "",
            "isWinner": win,
            "nomineeOrder": order,
            "creditedArtists": [{ "tivoInfo": { "damDynamic": format!("https://img/{}", order) } }]
        })
    }

    fn page(categories: Value) -> Value {
        json!({
            "props": { "pageProps": { "pageContent": {
                "getAwardsYears": { "hits": [{
                    "title": "67th Annual GRAMMY Awards",
                    "categoryDetails": categories
                }]},
                "getAwardsYearsList": { "hits": [
                    { "slug": "awards/67th-annual-grammy-awards-2024" },
                    { "slug": "/awards/66th-annual-grammy-awards-2023" }
                ]}
            }}}
        })
    }

    #[test]
    fn test_nominations_sorted_by_order() {
        let data = page(json!([{
            "title": [{ "name": "Record Of The Year" }],
            "nominations": [
                nomination("\"Three\"", json!("C"), Value::Null, 3, false),
                nomination("\"One\"", json!("A"), Value::Null, 1, true),
                nomination("\"Two\"", json!("B"), Value::Null, 2, false),
            ]
        }]));

        let records = parse_ceremony(&data, &GrammyConfig::default()).unwrap();
        let orders: Vec<_> = records.iter().map(|r| r.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(records[0].subject, "One");
        assert!(records[0].win);
        assert_eq!(records[0].year, 2024);
        assert_eq!(records[0].edition, 67);
        assert_eq!(records[0].avatar, "https://img/1");
    }

    #[test]
    fn test_credit_falls_back_to_parenthesized_line3() {
        let data = page(json!([{
            "title": [{ "name": "Song Of The Year" }],
            "nominations": [nomination(
                "\"Good Luck, Babe!\"",
                json!(""),
                json!("Kayleigh Rose Amstutz, Daniel Nigro \\u0026 Justin Tranter, songwriters (Chappell Roan)"),
                1,
                false,
            )]
        }]));

        let records = parse_ceremony(&data, &GrammyConfig::default()).unwrap();
        assert_eq!(records[0].credit, "Chappell Roan");
        assert_eq!(
            records[0].details,
            "Kayleigh Rose Amstutz, Daniel Nigro & Justin Tranter, songwriters (Chappell Roan)"
        );
    }

    #[test]
    fn test_credit_strips_tags() {
        let data = page(json!([{
            "title": [{ "name": "Record Of The Year" }],
            "nominations": [nomination(
                "\"Not Like Us\"",
                json!("<a href=\"/artists/kendrick-lamar/17949\">Kendrick Lamar</a>"),
                Value::Null,
                1,
                true,
            )]
        }]));

        let records = parse_ceremony(&data, &GrammyConfig::default()).unwrap();
        assert_eq!(records[0].credit, "Kendrick Lamar");
        assert_eq!(records[0].details, "");
    }

    #[test]
    fn test_single_sided_quote_kept() {
        let data = page(json!([{
            "title": [{ "name": "Best Album" }],
            "nominations": [nomination("\"Awaken", json!("A"), Value::Null, 1, false)]
        }]));

        let records = parse_ceremony(&data, &GrammyConfig::default()).unwrap();
        assert_eq!(records[0].subject, "\"Awaken");
    }

    #[test]
    fn test_missing_tivo_info_uses_default_avatar() {
        let mut n = nomination("\"X\"", json!("A"), Value::Null, 1, false);
        n["creditedArtists"][0]["tivoInfo"] = Value::Null;
        let data = page(json!([{ "title": [{ "name": "Best Album" }], "nominations": [n] }]));

        let config = GrammyConfig::default();
        let records = parse_ceremony(&data, &config).unwrap();
        assert_eq!(records[0].avatar, config.default_avatar);
    }

    #[test]
    fn test_missing_credited_artist_fails() {
        let mut n = nomination("\"X\"", json!("A"), Value::Null, 1, false);
        n["creditedArtists"] = json!([]);
        let data = page(json!([{ "title": [{ "name": "Best Album" }], "nominations": [n] }]));

        assert!(parse_ceremony(&data, &GrammyConfig::default()).is_err());
    }

    #[test]
    fn test_ceremony_links() {
        let links = ceremony_links(&page(json!([])), "https://www.grammy.com/").unwrap();
        assert_eq!(
            links,
            vec![
                "https://www.grammy.com/awards/67th-annual-grammy-awards-2024",
                "https://www.grammy.com/awards/66th-annual-grammy-awards-2023",
            ]
        );
    }

    #[test]
    fn test_next_data() {
        let html = r#"<html><head><script id="__NEXT_DATA__" type="application/json">{"props":{"a":1}}</script></head></html>"#;
        let data = next_data(html).unwrap();
        assert_eq!(data["props"]["a"], 1);
    }

    #[test]
    fn test_page_key() {
        assert_eq!(
            page_key("https://www.grammy.com/awards/66th-annual-grammy-awards-2023"),
            "grammy-66th-annual-grammy-awards-2023.html"
        );
    }
}
