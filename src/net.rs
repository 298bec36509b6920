//! HTTP fetching.
//!
//! Every scraper talks to the network through `PageSource`, so pages can also
//! come from the local cache or, in tests, from memory.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::config::FetchConfig;
use crate::error::{ScrapeError, ScrapeResult};

/// Where raw pages and image bytes come from.
pub trait PageSource: Sync {
    fn fetch_text(&self, url: &str) -> ScrapeResult<String>;

    fn fetch_bytes(&self, url: &str) -> ScrapeResult<Vec<u8>>;
}

/// Live HTTP GET with a static browser `User-Agent`. Any non-2xx status is an
/// error for that page; nothing is retried.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> ScrapeResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(ScrapeError::Client)?;

        Ok(Self { client })
    }

    fn get(&self, url: &str) -> ScrapeResult<reqwest::blocking::Response> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|source| ScrapeError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        debug!(url, status = status.as_u16(), "fetched");
        Ok(response)
    }
}

impl PageSource for HttpFetcher {
    fn fetch_text(&self, url: &str) -> ScrapeResult<String> {
        self.get(url)?
            .text()
            .map_err(|source| ScrapeError::Transport {
                url: url.to_string(),
                source,
            })
    }

    fn fetch_bytes(&self, url: &str) -> ScrapeResult<Vec<u8>> {
        self.get(url)?
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|source| ScrapeError::Transport {
                url: url.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetcher_builds_from_default_config() {
        assert!(HttpFetcher::new(&FetchConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_user_agent_is_a_client_error() {
        let config = FetchConfig {
            user_agent: "bad\nagent".to_string(),
            ..FetchConfig::default()
        };

        let err = HttpFetcher::new(&config).err().unwrap();
        assert!(matches!(err, ScrapeError::Client(_)));
        assert!(err.to_string().starts_with("failed to build HTTP client"));
    }
}
