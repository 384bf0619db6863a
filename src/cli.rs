//! Command-line interface definitions for Review Harvest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Connection settings can also come from environment variables; credentials
//! are never accepted as flags (see [`crate::secrets`]).

use crate::browser::BrowserKind;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Review Harvest application.
///
/// # Examples
///
/// ```sh
/// # Scrape the default 10 pages into rym_data.csv
/// RYM_USERNAME=me RYM_PASSWORD=secret review_harvest
///
/// # Scrape 3 pages headless with a custom site profile
/// review_harvest -p 3 --headless --profile ./rym.yaml -o ./out/reviews.csv
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Number of listing pages to scrape
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// CSV file that scraped rows are appended to
    #[arg(short, long, default_value = "rym_data.csv")]
    pub output: PathBuf,

    /// Log file (overwritten on every run)
    #[arg(long, default_value = "log.log")]
    pub log_file: PathBuf,

    /// Optional YAML site profile overriding selectors and URLs
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// WebDriver server URL (geckodriver, chromedriver, selenium)
    #[arg(long, env = "WEBDRIVER_URL", default_value = "http://localhost:4444")]
    pub webdriver_url: String,

    /// Browser to launch through the WebDriver server
    #[arg(long, value_enum, default_value_t = BrowserKind::Firefox)]
    pub browser: BrowserKind,

    /// Run the browser without a visible window
    #[arg(long)]
    pub headless: bool,

    /// Give up after this many consecutive failed "next page" clicks (0 = never)
    #[arg(long, default_value_t = 3)]
    pub max_stalls: usize,

    /// Skip the randomized delay between pages
    #[arg(long)]
    pub no_throttle: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["review_harvest"]);

        assert_eq!(cli.pages, 10);
        assert_eq!(cli.output, PathBuf::from("rym_data.csv"));
        assert_eq!(cli.log_file, PathBuf::from("log.log"));
        assert_eq!(cli.browser, BrowserKind::Firefox);
        assert_eq!(cli.max_stalls, 3);
        assert!(!cli.headless);
        assert!(!cli.no_throttle);
        assert!(cli.profile.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "review_harvest",
            "-p",
            "2",
            "-o",
            "/tmp/reviews.csv",
            "--browser",
            "chrome",
            "--headless",
        ]);

        assert_eq!(cli.pages, 2);
        assert_eq!(cli.output, PathBuf::from("/tmp/reviews.csv"));
        assert_eq!(cli.browser, BrowserKind::Chrome);
        assert!(cli.headless);
    }

    #[test]
    fn test_cli_rejects_zero_pages() {
        assert!(Cli::try_parse_from(["review_harvest", "--pages", "0"]).is_err());
    }
}
