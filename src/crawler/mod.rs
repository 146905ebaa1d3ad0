//! Image search crawler.
//!
//! Callers hand over a keyword, a size filter, a target directory and a count,
//! and get numbered image files on disk back. How results are found and fetched
//! stays in here.

mod download;
mod parse;
mod request;

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use reqwest::Client;

use crate::{info_time, warn_time, Result};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Hard stop on how many result pages are walked for a single keyword.
const MAX_RESULT_PAGES: usize = 5;
/// Collect more candidate URLs than files wanted, some downloads always fail.
const URL_POOL_FACTOR: usize = 2;

/// Which search engine backs the crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Engine {
    Google,
    #[default]
    Bing,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Google => "google",
            Engine::Bing => "bing",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image size restriction passed to the search engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeFilter {
    Large,
}

/// Everything a single crawl needs.
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub keyword: String,
    pub root_dir: PathBuf,
    pub size: SizeFilter,
    pub max_num: usize,
    /// Files are numbered from `file_idx_offset + 1`.
    pub file_idx_offset: usize,
    pub overwrite: bool,
}

pub trait ImageCrawler {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Writes up to `request.max_num` images into `request.root_dir` and returns
    /// how many were written.
    fn crawl(&self, request: &CrawlRequest) -> impl Future<Output = Result<usize>> + Send;
}

/// Crawler backed by a public image search results page.
#[derive(Debug, Clone)]
pub struct SearchCrawler {
    engine: Engine,
    client: Client,
    downloader_threads: usize,
}

impl SearchCrawler {
    pub fn new(engine: Engine, downloader_threads: usize) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            engine,
            client,
            downloader_threads: downloader_threads.max(1),
        })
    }

    /// Walks result pages until enough distinct candidate URLs are collected or
    /// a page yields nothing new.
    async fn collect_urls(&self, request: &CrawlRequest) -> Result<Vec<String>> {
        let wanted = request.max_num.saturating_mul(URL_POOL_FACTOR);
        let mut seen = HashSet::new();
        let mut urls = Vec::with_capacity(wanted);

        for page in 0..MAX_RESULT_PAGES {
            let html = match request::request_results_page(
                &self.client,
                self.engine,
                &request.keyword,
                request.size,
                page,
            )
            .await
            {
                Ok(html) => html,
                // Nothing to work with yet, so the whole crawl failed.
                Err(e) if urls.is_empty() => return Err(e),
                Err(e) => {
                    warn_time!("Result page {} from {} failed: {}", page, self.engine, e);
                    break;
                }
            };

            let found = parse::parse_image_urls(self.engine, html).await?;
            let before = urls.len();
            for url in found {
                if seen.insert(url.clone()) {
                    urls.push(url);
                }
            }
            info_time!(
                "{}: page {} gave {} new image urls",
                self.engine,
                page,
                urls.len() - before
            );

            if urls.len() == before || urls.len() >= wanted {
                break;
            }
        }
        Ok(urls)
    }
}

impl ImageCrawler for SearchCrawler {
    fn name(&self) -> &str {
        self.engine.as_str()
    }

    async fn crawl(&self, request: &CrawlRequest) -> Result<usize> {
        let urls = self.collect_urls(request).await?;
        if urls.is_empty() {
            warn_time!("{} returned no images for '{}'", self.engine, request.keyword);
            return Ok(0);
        }
        download::download_images(&self.client, urls, request, self.downloader_threads).await
    }
}
