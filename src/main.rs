use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use award_scrape::config::{load_config, AppConfig, CacheMode};
use award_scrape::export::{self, Thumbnails, WorkbookWriter};
use award_scrape::net::HttpFetcher;
use award_scrape::scrapers::rolling_stone::ListEdition;
use award_scrape::scrapers::{cannes, douban, grammy, oscars, rolling_stone};
use award_scrape::storage::{CachedSource, PageCache};
use award_scrape::ChartEntry;

#[derive(Parser, Debug)]
#[command(name = "award-scrape", version, about = "Scrape award-show and chart pages into spreadsheets")]
struct Cli {
    /// YAML config; built-in defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base directory for relative config, cache and output paths
    #[arg(long, global = true, env = "ROOT", default_value = ".")]
    root: PathBuf,

    /// Overrides `fetch.cache_dir`
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Overrides `fetch.cache_mode`
    #[arg(long, global = true, value_enum)]
    cache: Option<CacheMode>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cannes festival awards and official selection
    Cannes {
        #[arg(long)]
        from: Option<u16>,
        #[arg(long)]
        to: Option<u16>,
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Academy Awards ceremonies
    Oscars {
        #[arg(long)]
        from: Option<u16>,
        #[arg(long)]
        to: Option<u16>,
    },
    /// GRAMMY Awards nominations
    Grammy {
        /// Add a thumbnail column with each nominee's avatar
        #[arg(long)]
        with_images: bool,
    },
    /// Rolling Stone "500 Greatest Albums of All Time"
    RollingStone {
        #[arg(long, value_enum, default_value = "2023")]
        list: ListEdition,
    },
    /// Douban movie Top 250
    Douban,
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn output_path(root: &Path, stem: &str, extension: &str) -> PathBuf {
    resolve(root, Path::new(&format!("{}.{}", stem, extension)))
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref().map(|p| resolve(&cli.root, p));
    let mut config: AppConfig = load_config(config_path.as_deref())?;

    if let Some(dir) = cli.cache_dir {
        config.fetch.cache_dir = dir;
    }
    if let Some(mode) = cli.cache {
        config.fetch.cache_mode = mode;
    }

    let fetcher = HttpFetcher::new(&config.fetch).context("Failed to build HTTP client")?;
    let cache = PageCache::new(resolve(&cli.root, &config.fetch.cache_dir));
    let source = CachedSource::new(&fetcher, &cache, config.fetch.cache_mode);
    info!("Using page cache {:?} ({:?})", cache.dir(), config.fetch.cache_mode);

    match cli.command {
        Command::Cannes { from, to, threads } => {
            let mut cannes_config = config.cannes;
            cannes_config.from_year = from.unwrap_or(cannes_config.from_year);
            cannes_config.to_year = to.unwrap_or(cannes_config.to_year);
            cannes_config.threads = threads.or(cannes_config.threads);

            let results = cannes::run(&cannes_config, &source)?;

            let mut writer = WorkbookWriter::new();
            writer.add_sheet("awards", &results.awards)?;
            writer.add_sheet("selection", &results.selection)?;
            writer.save(&output_path(&cli.root, &cannes_config.output, "xlsx"))?;
        }
        Command::Oscars { from, to } => {
            let mut oscars_config = config.oscars;
            oscars_config.from_year = from.or(oscars_config.from_year);
            oscars_config.to_year = to.or(oscars_config.to_year);

            let records = oscars::run(&oscars_config, &source)?;
            export::write_workbook(
                &output_path(&cli.root, &oscars_config.output, "xlsx"),
                "oscars",
                &records,
            )?;
        }
        Command::Grammy { with_images } => {
            let grammy_config = config.grammy;
            let records = grammy::run(&grammy_config, &source)?;
            let path = output_path(&cli.root, &grammy_config.output, "xlsx");

            let mut writer = WorkbookWriter::new();
            if with_images || grammy_config.with_images {
                let mut thumbnails = Thumbnails::new(&fetcher, &grammy_config.default_avatar);
                writer.add_sheet_with_images("grammy", &records, &mut thumbnails)?;
            } else {
                writer.add_sheet("grammy", &records)?;
            }
            writer.save(&path)?;
        }
        Command::RollingStone { list } => {
            let entries = rolling_stone::run(&config.rolling_stone, list, &source)?;
            let stem = list.output(&config.rolling_stone);

            let csv_path = output_path(&cli.root, stem, "csv");
            export::write_csv(&csv_path, &entries)?;

            let entries: Vec<ChartEntry> = export::read_csv(&csv_path)?;
            export::write_workbook(&output_path(&cli.root, stem, "xlsx"), "Sheet1", &entries)?;
        }
        Command::Douban => {
            let douban_config = config.douban;
            let movies = douban::run(&douban_config, &source)?;
            export::write_workbook(
                &output_path(&cli.root, &douban_config.output, "xlsx"),
                &douban_config.sheet,
                &movies,
            )?;
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
