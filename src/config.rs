//! Run configuration.
//!
//! Loaded from an optional YAML file; every key falls back to the built-in
//! defaults below, so an empty or absent file reproduces the stock scrapers.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::period::EditionCalendar;
use crate::pipeline::PageLayout;
use crate::scrapers::{cannes, oscars};

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36";

/// How pages are resolved against the local page cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Use a cached page when present, fetch and store it otherwise
    #[default]
    Prefer,
    /// Never fetch; a page missing from the cache is an error
    Only,
    /// Always fetch and overwrite the cached copy
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub cache_dir: PathBuf,
    pub cache_mode: CacheMode,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout_secs: 30,
            cache_dir: PathBuf::from("cache"),
            cache_mode: CacheMode::Prefer,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CannesConfig {
    pub calendar: EditionCalendar,
    /// `{year}` is substituted
    pub awards_url: String,
    pub selection_url: String,
    pub from_year: u16,
    pub to_year: u16,
    /// Worker threads for the per-year fan-out; `None` uses rayon's default
    pub threads: Option<usize>,
    pub output: String,
    pub selection_layout: PageLayout,
    pub awards_layout: PageLayout,
}

impl Default for CannesConfig {
    fn default() -> Self {
        Self {
            // no festival in 1948 and 1950 (budget problems)
            calendar: EditionCalendar::new(1946, vec![1948, 1950]),
            awards_url: "https://www.festival-cannes.com/en/retrospective/{year}/awards/".to_string(),
            selection_url: "https://www.festival-cannes.com/en/retrospective/{year}/selection/"
                .to_string(),
            from_year: 1946,
            to_year: 2024,
            threads: None,
            output: "cannes-festival".to_string(),
            selection_layout: cannes::selection_layout(),
            awards_layout: cannes::awards_layout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OscarsConfig {
    pub calendar: EditionCalendar,
    pub url: String,
    pub from_year: Option<u16>,
    /// `None` means the current year
    pub to_year: Option<u16>,
    pub output: String,
    pub layout: PageLayout,
}

impl Default for OscarsConfig {
    fn default() -> Self {
        Self {
            calendar: EditionCalendar::new(1929, vec![]),
            url: "https://www.oscars.org/oscars/ceremonies/{year}".to_string(),
            from_year: None,
            to_year: None,
            output: "oscars-of-all-years".to_string(),
            layout: oscars::layout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammyConfig {
    pub domain: String,
    /// Ceremony page whose data also lists every other ceremony
    pub entry_url: String,
    /// The first ceremony (held 1959) honored 1958 and is listed as the
    /// 1958 awards, so `year = base_year + edition`
    pub base_year: u16,
    pub default_avatar: String,
    pub output: String,
    pub with_images: bool,
}

impl Default for GrammyConfig {
    fn default() -> Self {
        Self {
            domain: "https://www.grammy.com/".to_string(),
            entry_url: "https://www.grammy.com/awards/67th-annual-grammy-awards-2024".to_string(),
            base_year: 1957,
            default_avatar: "https://naras.a.bigcontent.io/v1/static/artist_default_200x200"
                .to_string(),
            output: "grammy-awards-of-all-years".to_string(),
            with_images: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RollingStoneConfig {
    pub list_2003_url: String,
    pub list_2003_output: String,
    pub list_2023_url: String,
    pub list_2023_output: String,
}

impl Default for RollingStoneConfig {
    fn default() -> Self {
        Self {
            list_2003_url:
                "https://www.rollingstone.com/music/music-lists/500-greatest-albums-of-all-time-156826/"
                    .to_string(),
            list_2003_output: "rollingstone_best_albums_of_all_time_2003".to_string(),
            list_2023_url:
                "https://www.rollingstone.com/music/music-lists/best-albums-of-all-time-1062063/"
                    .to_string(),
            list_2023_output: "rollingstone_best_albums_of_all_time_2023".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DoubanConfig {
    pub base_url: String,
    pub pages: u32,
    pub page_size: u32,
    pub output: String,
    pub sheet: String,
}

impl Default for DoubanConfig {
    fn default() -> Self {
        Self {
            base_url: "https://movie.douban.com/top250?start=".to_string(),
            pages: 10,
            page_size: 25,
            output: "douban-movie-top250".to_string(),
            sheet: "豆瓣电影top250".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub fetch: FetchConfig,
    pub cannes: CannesConfig,
    pub oscars: OscarsConfig,
    pub grammy: GrammyConfig,
    pub rolling_stone: RollingStoneConfig,
    pub douban: DoubanConfig,
}

/// Load the YAML config at `path`, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {:?}", path))?;

    parse_config(&content).with_context(|| format!("Failed to parse config {:?}", path))
}

pub fn parse_config(content: &str) -> Result<AppConfig> {
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    let config: AppConfig = serde_yaml::from_str(content)?;
    Ok(config)
}

/// Substitute `{year}` in a URL template
pub fn year_url(template: &str, year: u16) -> String {
    template.replace("{year}", &year.to_string())
}
