//! The pagination loop: log in, open the listing, and harvest page after page.
//!
//! # Session Flow
//!
//! 1. **Init**: open the "latest" landing page
//! 2. **Authenticate** (best-effort): fill and submit the login form
//! 3. **Expand** (best-effort): script-click the "[+all reviews]" link
//! 4. **Navigate**: open the first listing page
//! 5. **Loop**: capture → extract → append → click "next" → throttle, until
//!    the page budget is spent or the listing stops advancing
//!
//! The browser session is closed on every exit path, including errors from
//! any of the steps above.
//!
//! # Stalls
//!
//! When the "next" control cannot be clicked the browser stays on the same
//! page, and the following iteration scrapes it again. After
//! [`PagerSettings::max_consecutive_stalls`] such failures in a row the loop
//! gives up instead of burning the rest of the budget on duplicates.

use crate::browser::{Browser, BrowserError};
use crate::models::{Advance, AuthOutcome, ExpandOutcome, RunSummary};
use crate::outputs::csv::{CsvSink, OutputError};
use crate::profile::{Controls, SiteProfile};
use crate::scrapers::reviews::ReviewExtractor;
use crate::secrets::{Credentials, SecretSource};
use rand::{Rng, rng};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, debug, error, info, warn};

#[derive(Debug, Error)]
pub enum PagerError {
    #[error(transparent)]
    Browser(#[from] BrowserError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Randomized pause between page loads.
///
/// The delay is a whole number of seconds drawn from `[min_secs, max_secs)`
/// plus a uniform fraction of a second, so the default lands in `[5, 11)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    min_secs: u64,
    max_secs: u64,
    enabled: bool,
}

impl Default for Throttle {
    fn default() -> Self {
        Self {
            min_secs: 5,
            max_secs: 10,
            enabled: true,
        }
    }
}

impl Throttle {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn delay(&self) -> Duration {
        if !self.enabled {
            return Duration::ZERO;
        }
        let mut rng = rng();
        let whole = rng.random_range(self.min_secs..self.max_secs);
        let fraction: f64 = rng.random();
        Duration::from_secs_f64(whole as f64 + fraction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerSettings {
    /// Stop after this many "next" failures in a row. Zero never stops early.
    pub max_consecutive_stalls: usize,
    pub throttle: Throttle,
}

impl Default for PagerSettings {
    fn default() -> Self {
        Self {
            max_consecutive_stalls: 3,
            throttle: Throttle::default(),
        }
    }
}

/// Drives one browser session through the review listing.
pub struct Pager<B, S> {
    browser: B,
    secrets: S,
    profile: SiteProfile,
    extractor: ReviewExtractor,
    sink: CsvSink,
    settings: PagerSettings,
    log: Dispatch,
}

impl<B, S> Pager<B, S>
where
    B: Browser,
    S: SecretSource,
{
    /// `extractor` is built from the same `profile` beforehand so selector
    /// errors surface before a browser session exists.
    pub fn new(
        browser: B,
        secrets: S,
        profile: SiteProfile,
        extractor: ReviewExtractor,
        sink: CsvSink,
        settings: PagerSettings,
        log: Dispatch,
    ) -> Self {
        Self {
            browser,
            secrets,
            profile,
            extractor,
            sink,
            settings,
            log,
        }
    }

    /// Scrape up to `page_budget` listing pages, then close the session.
    pub async fn run(self, page_budget: usize) -> Result<RunSummary, PagerError> {
        let log = self.log.clone();
        self.run_and_close(page_budget).with_subscriber(log).await
    }

    async fn run_and_close(mut self, page_budget: usize) -> Result<RunSummary, PagerError> {
        let result = self.harvest(page_budget).await;
        if let Err(e) = &result {
            error!(error = %e, "Scrape aborted");
        }

        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Failed to close browser session");
        }
        result
    }

    async fn harvest(&mut self, page_budget: usize) -> Result<RunSummary, PagerError> {
        info!(page_budget, output = %self.sink.path().display(), "Starting scrape");

        self.browser.goto(self.profile.latest_url.as_str()).await?;

        let auth = self.authenticate().await;
        match &auth {
            AuthOutcome::Authenticated => info!("Logged in"),
            AuthOutcome::SkippedNoControls | AuthOutcome::SkippedNoCredentials => {
                warn!(outcome = %auth, "Continuing without logging in")
            }
            AuthOutcome::Failed(_) => error!(outcome = %auth, "Login failed; continuing"),
        }

        match self.expand().await {
            ExpandOutcome::Expanded => info!("Expanded all reviews"),
            outcome @ ExpandOutcome::SkippedNoControl => {
                warn!(%outcome, "Could not expand reviews")
            }
            outcome @ ExpandOutcome::Failed(_) => error!(%outcome, "Could not expand reviews"),
        }

        self.browser.goto(self.profile.listing_url.as_str()).await?;

        let mut summary = RunSummary::new(auth);
        let mut consecutive_stalls = 0usize;

        while summary.pages_scraped < page_budget {
            let page = summary.pages_scraped + 1;
            let source = self.browser.page_source().await?;
            let rows = self.extractor.extract_source(&source);
            if rows.is_empty() {
                summary.empty_pages += 1;
                warn!(page, "Page contained no reviews");
            }
            summary.rows_written += self.sink.append(&rows).await?;
            debug!(page, rows = rows.len(), "Appended page rows");

            match self.advance().await {
                Advance::Advanced => consecutive_stalls = 0,
                Advance::Stalled(reason) => {
                    summary.stalls += 1;
                    consecutive_stalls += 1;
                    error!(page, consecutive_stalls, %reason, "Next page did not load");
                }
            }

            sleep(self.settings.throttle.delay()).await;
            summary.pages_scraped += 1;
            info!("Finished scraping page# {}", summary.pages_scraped);

            let limit = self.settings.max_consecutive_stalls;
            if limit > 0 && consecutive_stalls >= limit && summary.pages_scraped < page_budget {
                summary.aborted_on_stalls = true;
                error!(
                    consecutive_stalls,
                    remaining = page_budget - summary.pages_scraped,
                    "Listing stopped advancing; giving up on remaining pages"
                );
                break;
            }
        }

        info!(
            rows = summary.rows_written,
            stalls = summary.stalls,
            "Total scraped pages: {}",
            summary.pages_scraped
        );
        Ok(summary)
    }

    async fn authenticate(&mut self) -> AuthOutcome {
        let controls = &self.profile.controls;
        for locator in [&controls.username, &controls.password, &controls.login_submit] {
            match self.browser.is_present(locator).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(%locator, "Login control missing");
                    return AuthOutcome::SkippedNoControls;
                }
                Err(e) => return AuthOutcome::Failed(e.to_string()),
            }
        }

        let Some(credentials) = self.secrets.credentials() else {
            return AuthOutcome::SkippedNoCredentials;
        };

        match submit_login(&mut self.browser, controls, &credentials).await {
            Ok(()) => AuthOutcome::Authenticated,
            Err(e) => AuthOutcome::Failed(e.to_string()),
        }
    }

    async fn expand(&mut self) -> ExpandOutcome {
        let link = &self.profile.controls.expand_reviews;
        match self.browser.is_present(link).await {
            Ok(true) => {}
            Ok(false) => return ExpandOutcome::SkippedNoControl,
            Err(e) => return ExpandOutcome::Failed(e.to_string()),
        }
        match self.browser.script_click(link).await {
            Ok(()) => ExpandOutcome::Expanded,
            Err(e) => ExpandOutcome::Failed(e.to_string()),
        }
    }

    async fn advance(&mut self) -> Advance {
        let controls = &self.profile.controls;
        let wait = Duration::from_secs(controls.next_page_wait_secs);
        match self.browser.wait_and_click(&controls.next_page, wait).await {
            Ok(()) => Advance::Advanced,
            Err(e) => Advance::Stalled(e.to_string()),
        }
    }
}

async fn submit_login<B: Browser>(
    browser: &mut B,
    controls: &Controls,
    credentials: &Credentials,
) -> Result<(), BrowserError> {
    browser
        .type_into(&controls.username, &credentials.username)
        .await?;
    browser
        .type_into(&controls.password, credentials.password.expose())
        .await?;
    browser.click(&controls.login_submit).await?;
    browser
        .set_implicit_wait(Duration::from_secs(controls.implicit_wait_secs))
        .await
}
