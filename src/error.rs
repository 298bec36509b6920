//! Error taxonomy for fetching and extraction.
//!
//! Three families matter to callers:
//! - transport: the page could not be fetched (`Client`, `Transport`, `Status`, `CacheMiss`)
//! - structural mismatch: an expected element or field is absent
//! - malformed payload: embedded JSON does not decode or cannot be isolated
//!
//! None of them is recovered per item. A page either extracts fully or fails.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("page `{key}` is not cached at {path:?} and fetching is disabled")]
    CacheMiss { key: String, path: PathBuf },

    #[error("missing element `{selector}` in {context}")]
    MissingElement { selector: String, context: String },

    #[error("missing attribute `{attr}` on `{selector}`")]
    MissingAttribute { attr: String, selector: String },

    #[error("missing JSON field `{0}`")]
    MissingField(String),

    #[error("could not split `{input}` on any of {delimiters:?}")]
    Unsplittable {
        input: String,
        delimiters: Vec<String>,
    },

    #[error("invalid JSON payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("pattern `{pattern}` did not match {context}")]
    PatternMiss { pattern: String, context: String },

    #[error("invalid selector `{0}`")]
    Selector(String),

    #[error("{0}")]
    Period(String),

    #[error("pagination revisited {0}")]
    Pagination(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ScrapeResult<T> = std::result::Result<T, ScrapeError>;
