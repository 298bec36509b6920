//! award_scrape library
//!
//! Scrapers for award-show and chart pages, and the spreadsheet export they
//! share.

pub mod config;
pub mod error;
pub mod export;
pub mod net;
pub mod normalize;
pub mod period;
pub mod pipeline;
pub mod scrapers;
pub mod storage;
pub mod types;

pub use types::*;
