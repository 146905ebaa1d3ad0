use std::path::PathBuf;

use chrono::Local;
use tokio::task::spawn_blocking;

use crate::cdn::CdnTarget;
use crate::crawler::{CrawlRequest, Engine, ImageCrawler, SearchCrawler, SizeFilter};
use crate::ident::{build_tasks, Task};
use crate::normalize::{count_images, filter_and_normalize, normalize_output_dir_images};
use crate::query::search_query;
use crate::records::PoiRecords;
use crate::{
    info_time, warn_time, Result, BASE_OUTPUT_DIR, CRAWL_MAX_NUM, CSV_FILE, DOWNLOADER_THREADS,
    MAX_IMAGES,
};

/// Runtime settings, normally filled in from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub csv_path: PathBuf,
    pub output_dir: PathBuf,
    pub engine: Engine,
    /// `None` or `Some(0)` processes every row.
    pub limit: Option<usize>,
    pub downloader_threads: usize,
    pub print_cdn_urls: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from(CSV_FILE),
            output_dir: PathBuf::from(BASE_OUTPUT_DIR),
            engine: Engine::default(),
            limit: None,
            downloader_threads: DOWNLOADER_THREADS,
            print_cdn_urls: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Directory already had a full set, only renumbered.
    Skipped { kept: usize },
    Crawled { downloaded: usize, kept: usize },
    /// The crawler errored; whatever landed on disk was still filtered.
    CrawlFailed { kept: usize },
}

impl TaskOutcome {
    pub fn kept(&self) -> usize {
        match *self {
            TaskOutcome::Skipped { kept }
            | TaskOutcome::Crawled { kept, .. }
            | TaskOutcome::CrawlFailed { kept } => kept,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub skipped: usize,
    pub crawled: usize,
    pub crawl_failed: usize,
    /// Tasks that errored outside the crawler, e.g. on the filesystem.
    pub failed: usize,
    /// Tasks ending with a full set of images.
    pub complete: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Skipped { .. } => self.skipped += 1,
            TaskOutcome::Crawled { .. } => self.crawled += 1,
            TaskOutcome::CrawlFailed { .. } => self.crawl_failed += 1,
        }
        if outcome.kept() >= MAX_IMAGES {
            self.complete += 1;
        }
    }
}

/// Reads the source file, builds every task and works through them one by one.
/// A missing source file is reported and the run ends without error.
pub async fn run(config: &RunConfig) -> Result<Option<RunSummary>> {
    let start_time = Local::now();

    if !config.csv_path.is_file() {
        warn_time!("Error: {} not found.", config.csv_path.display());
        return Ok(None);
    }

    let tasks = build_tasks(
        PoiRecords::open(&config.csv_path)?,
        &config.output_dir,
        config.limit,
    )?;
    info_time!("Parsed {} attractions.", tasks.len());

    let crawler = SearchCrawler::new(config.engine, config.downloader_threads)?;
    let cdn = config.print_cdn_urls.then(CdnTarget::default);
    let summary = process_tasks(&crawler, &tasks, cdn.as_ref()).await;

    info_time!(
        start_time,
        "Done: {} crawled, {} skipped, {} crawl failures, {} errors, {} complete",
        summary.crawled,
        summary.skipped,
        summary.crawl_failed,
        summary.failed,
        summary.complete
    );
    Ok(Some(summary))
}

/// Processes tasks in order. A failing task is reported and never stops the loop.
pub async fn process_tasks<C: ImageCrawler>(
    crawler: &C,
    tasks: &[Task],
    cdn: Option<&CdnTarget>,
) -> RunSummary {
    let mut summary = RunSummary::default();

    for task in tasks {
        match process_task(crawler, task).await {
            Ok(outcome) => {
                summary.record(&outcome);
                if let Some(cdn) = cdn {
                    if outcome.kept() > 0 {
                        for url in cdn.task_image_urls(task, outcome.kept()) {
                            println!("{url}");
                        }
                    }
                }
            }
            Err(e) => {
                summary.failed += 1;
                warn_time!("Failed processing {}: {}", task.interest, e);
            }
        }
    }
    summary
}

/// The request handed to the crawler for `task`.
pub fn crawl_request(task: &Task) -> CrawlRequest {
    CrawlRequest {
        keyword: search_query(&task.interest),
        root_dir: task.output_dir.clone(),
        size: SizeFilter::Large,
        max_num: CRAWL_MAX_NUM,
        file_idx_offset: 0,
        overwrite: true,
    }
}

/// Fetches and filters images for one attraction. Directories that already
/// hold a full set are only renumbered, so re-runs do not hit the network.
pub async fn process_task<C: ImageCrawler>(crawler: &C, task: &Task) -> Result<TaskOutcome> {
    let dir = task.output_dir.clone();

    if count_images(&dir)? >= MAX_IMAGES {
        let kept = spawn_blocking(move || normalize_output_dir_images(&dir)).await??;
        info_time!("Skipping {}, already has {} images.", task.interest, kept);
        return Ok(TaskOutcome::Skipped { kept });
    }
    tokio::fs::create_dir_all(&dir).await?;

    info_time!(
        "Downloading images for: {} -> {} using {}",
        task.interest,
        dir.display(),
        crawler.name()
    );
    let request = crawl_request(task);
    let downloaded = match crawler.crawl(&request).await {
        Ok(n) => Some(n),
        Err(e) => {
            warn_time!("Crawler failed for {}: {}", task.interest, e);
            None
        }
    };

    let kept = spawn_blocking(move || filter_and_normalize(&dir)).await??;
    Ok(match downloaded {
        Some(downloaded) => TaskOutcome::Crawled { downloaded, kept },
        None => TaskOutcome::CrawlFailed { kept },
    })
}
