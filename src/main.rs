//! # Review Harvest
//!
//! Scrapes the latest reviews from rateyourmusic.com through a real browser
//! session and appends them to a CSV file.
//!
//! ## Usage
//!
//! ```sh
//! geckodriver --port 4444 &
//! RYM_USERNAME=me RYM_PASSWORD=secret review_harvest --pages 10
//! ```
//!
//! ## Architecture
//!
//! 1. **Session**: start a WebDriver session, log in, expand all reviews
//! 2. **Pagination**: capture each listing page and click through "Next 15"
//! 3. **Extraction**: turn each page's markup into review rows (pure, no I/O)
//! 4. **Output**: append the rows to the CSV file, one batch per page
//!
//! The process exits non-zero when the browser session fails, or when it
//! could not log in and came away with no reviews.

use clap::Parser;
use std::error::Error;
use std::time::Instant;
use tracing::{debug, error, info, warn};

mod browser;
mod cli;
mod logging;
mod models;
mod outputs;
mod pager;
mod profile;
mod scrapers;
mod secrets;
mod utils;

use browser::WebDriverSession;
use cli::Cli;
use outputs::csv::CsvSink;
use pager::{Pager, PagerSettings, Throttle};
use profile::SiteProfile;
use scrapers::reviews::ReviewExtractor;
use secrets::EnvSecrets;
use utils::ensure_writable_parent;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    // --- Tracing init ---
    let log = logging::file_dispatch(&args.log_file, logging::default_filter())?;
    tracing::dispatcher::set_global_default(log.clone())?;

    let start_time = Instant::now();
    info!("review_harvest starting up");
    debug!(?args, "Parsed CLI arguments");

    // Early check: the CSV location must be writable before a browser starts
    if let Err(e) = ensure_writable_parent(&args.output).await {
        error!(
            path = %args.output.display(),
            error = %e,
            "Output location is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Site profile ----
    let profile = match &args.profile {
        Some(path) => SiteProfile::load(path).await?,
        None => SiteProfile::default(),
    };
    let extractor = ReviewExtractor::new(&profile)?;

    // ---- Browser session ----
    let browser = match WebDriverSession::start(&args.webdriver_url, args.browser, args.headless).await {
        Ok(browser) => browser,
        Err(e) => {
            error!(url = %args.webdriver_url, error = %e, "Could not start browser session");
            return Err(e.into());
        }
    };

    let settings = PagerSettings {
        max_consecutive_stalls: args.max_stalls,
        throttle: if args.no_throttle {
            Throttle::disabled()
        } else {
            Throttle::default()
        },
    };

    let pager = Pager::new(
        browser,
        EnvSecrets::default(),
        profile,
        extractor,
        CsvSink::new(&args.output),
        settings,
        log,
    );
    let summary = pager.run(args.pages as usize).await?;

    let elapsed = start_time.elapsed();
    info!(
        pages = summary.pages_scraped,
        rows = summary.rows_written,
        empty_pages = summary.empty_pages,
        stalls = summary.stalls,
        auth = %summary.auth,
        secs = elapsed.as_secs(),
        "Execution complete"
    );

    if summary.rows_written == 0 && !summary.auth.is_authenticated() {
        warn!(auth = %summary.auth, "No reviews scraped without a login; the site likely blocked access");
        return Err(format!("no reviews scraped (login {})", summary.auth).into());
    }

    Ok(())
}
