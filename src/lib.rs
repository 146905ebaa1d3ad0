//! Point-of-interest photo fetcher.
//!
//! Reads `state||interest` rows, derives an identifier and output directory per
//! attraction, crawls an image search engine for candidates and keeps at most
//! six wide-enough photos named `1.jpg`..`6.jpg`.

pub mod cdn;
pub mod crawler;
mod error;
pub mod ident;
mod macros;
pub mod normalize;
pub mod process;
pub mod query;
pub mod records;

pub use error::{Error, Result};

/// Default location of the pipe-delimited source file.
pub const CSV_FILE: &str = "poi_by_state.csv";
pub const BASE_OUTPUT_DIR: &str = "assets/poi";
/// Images narrower than this are discarded.
pub const MIN_WIDTH: u32 = 1920;
/// Upper bound of images kept per attraction.
pub const MAX_IMAGES: usize = 6;
/// How many results are requested from the crawler, over-fetching so enough survive filtering.
pub const CRAWL_MAX_NUM: usize = 40;
pub const DOWNLOADER_THREADS: usize = 4;
pub const UNKNOWN_STATE_CODE: &str = "UNK";
