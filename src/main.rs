use std::path::PathBuf;

use chrono::Local;
use clap::Parser;
use poi_images::crawler::Engine;
use poi_images::process::{run, RunConfig};
use poi_images::{info_time, Result, BASE_OUTPUT_DIR, CSV_FILE, DOWNLOADER_THREADS};

/// Download and normalize point-of-interest photos listed in a `state||interest` file
#[derive(Debug, Parser)]
#[command(name = "poi-images", version, about)]
struct Cli {
    /// Limit the number of attractions to process (0 = no limit)
    #[arg(long)]
    limit: Option<usize>,

    /// Search engine to use
    #[arg(long, value_enum, default_value_t = Engine::Bing)]
    engine: Engine,

    /// Pipe-delimited source file
    #[arg(long, default_value = CSV_FILE)]
    csv: PathBuf,

    /// Root of the per-state output tree
    #[arg(long, default_value = BASE_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Concurrent image downloads per attraction
    #[arg(long, default_value_t = DOWNLOADER_THREADS)]
    threads: usize,

    /// Print the CDN URL of every kept image
    #[arg(long)]
    print_cdn_urls: bool,
}

impl From<Cli> for RunConfig {
    fn from(cli: Cli) -> Self {
        RunConfig {
            csv_path: cli.csv,
            output_dir: cli.output_dir,
            engine: cli.engine,
            limit: cli.limit,
            downloader_threads: cli.threads,
            print_cdn_urls: cli.print_cdn_urls,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Local::now();
    let config = RunConfig::from(Cli::parse());
    run(&config).await?;
    info_time!(start_time, "Full program time:");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_layout() {
        let config = RunConfig::from(Cli::try_parse_from(["poi-images"]).unwrap());
        assert_eq!(config.engine, Engine::Bing);
        assert_eq!(config.limit, None);
        assert_eq!(config.csv_path, PathBuf::from("poi_by_state.csv"));
        assert_eq!(config.output_dir, PathBuf::from("assets/poi"));
        assert_eq!(config.downloader_threads, 4);
        assert!(!config.print_cdn_urls);
    }

    #[test]
    fn parses_limit_and_engine() {
        let cli = Cli::try_parse_from(["poi-images", "--limit", "3", "--engine", "google"]).unwrap();
        assert_eq!(cli.limit, Some(3));
        assert_eq!(cli.engine, Engine::Google);
    }

    #[test]
    fn rejects_unknown_engine() {
        assert!(Cli::try_parse_from(["poi-images", "--engine", "yahoo"]).is_err());
    }
}
