use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::CacheMode;
use crate::error::{ScrapeError, ScrapeResult};
use crate::net::PageSource;

/// Raw pages stored as one file per key under a directory.
#[derive(Debug, Clone)]
pub struct PageCache {
    dir: PathBuf,
}

impl PageCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    pub fn load(&self, key: &str) -> ScrapeResult<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    pub fn store(&self, key: &str, content: &str) -> ScrapeResult<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), content)?;
        Ok(())
    }
}

/// Resolves a page from the cache or the network according to `CacheMode`.
pub struct CachedSource<'a, S: PageSource> {
    source: &'a S,
    cache: &'a PageCache,
    mode: CacheMode,
}

impl<'a, S: PageSource> CachedSource<'a, S> {
    pub fn new(source: &'a S, cache: &'a PageCache, mode: CacheMode) -> Self {
        Self { source, cache, mode }
    }

    /// Page `key`, fetched from `url` when the mode requires it.
    pub fn page(&self, key: &str, url: &str) -> ScrapeResult<String> {
        if self.mode != CacheMode::Refresh {
            if let Some(content) = self.cache.load(key)? {
                debug!(key, "cache hit");
                return Ok(content);
            }
        }

        if self.mode == CacheMode::Only {
            return Err(ScrapeError::CacheMiss {
                key: key.to_string(),
                path: self.cache.path(key),
            });
        }

        let content = self.source.fetch_text(url)?;
        self.cache.store(key, &content)?;
        info!("Successfully fetched {}", url);
        Ok(content)
    }
}
