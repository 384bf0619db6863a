//! Browser session abstraction.
//!
//! The pager only needs a handful of operations from a live browser, so they
//! are expressed as the [`Browser`] trait:
//! - [`WebDriverSession`]: drives a real browser through a WebDriver server
//!   (geckodriver, chromedriver) using `thirtyfour`
//! - test fakes: serve canned pages without a network
//!
//! Every lookup takes a [`Locator`] from the site profile, never a hardcoded
//! selector.

use crate::profile::Locator;
use std::time::{Duration, Instant};
use thirtyfour::prelude::*;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("element not found: {locator}")]
    NotFound { locator: String },
    #[error("timed out after {waited:?} waiting for {locator}")]
    Timeout { locator: String, waited: Duration },
    #[error("browser session error: {0}")]
    Session(String),
}

impl BrowserError {
    pub fn not_found(locator: &Locator) -> Self {
        BrowserError::NotFound {
            locator: locator.to_string(),
        }
    }
}

/// The browser operations the pager depends on.
///
/// Implementations are driven from a single task; methods take `&mut self`
/// so a session is never used concurrently.
pub trait Browser {
    /// Navigate to `url` and wait for the page to load.
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Current rendered page source.
    async fn page_source(&mut self) -> Result<String, BrowserError>;

    /// Whether an element matching `locator` is on the page.
    async fn is_present(&mut self, locator: &Locator) -> Result<bool, BrowserError>;

    /// Type `text` into the element matching `locator`.
    async fn type_into(&mut self, locator: &Locator, text: &str) -> Result<(), BrowserError>;

    /// Click the element matching `locator`.
    async fn click(&mut self, locator: &Locator) -> Result<(), BrowserError>;

    /// Scroll the element into view and click it through injected script,
    /// bypassing the driver's interactability checks.
    async fn script_click(&mut self, locator: &Locator) -> Result<(), BrowserError>;

    /// Wait up to `timeout` for `locator` to appear, then click it.
    async fn wait_and_click(&mut self, locator: &Locator, timeout: Duration)
    -> Result<(), BrowserError>;

    /// Set how long element lookups wait before giving up.
    async fn set_implicit_wait(&mut self, wait: Duration) -> Result<(), BrowserError>;

    /// End the session and release the browser.
    async fn close(self) -> Result<(), BrowserError>;
}

/// Which browser the WebDriver server should launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BrowserKind {
    Firefox,
    Chrome,
}

/// A [`Browser`] backed by a WebDriver server.
pub struct WebDriverSession {
    driver: WebDriver,
}

fn by(locator: &Locator) -> By {
    match locator {
        Locator::Id(id) => By::Id(id.as_str()),
        Locator::Css(css) => By::Css(css.as_str()),
        Locator::XPath(xpath) => By::XPath(xpath.as_str()),
    }
}

fn session_err(e: WebDriverError) -> BrowserError {
    BrowserError::Session(e.to_string())
}

impl WebDriverSession {
    /// Start a new browser session on the WebDriver server at `server_url`.
    #[instrument(level = "info")]
    pub async fn start(
        server_url: &str,
        kind: BrowserKind,
        headless: bool,
    ) -> Result<Self, BrowserError> {
        let t0 = Instant::now();
        let driver = match kind {
            BrowserKind::Firefox => {
                let mut caps = DesiredCapabilities::firefox();
                if headless {
                    caps.set_headless().map_err(session_err)?;
                }
                WebDriver::new(server_url, caps).await
            }
            BrowserKind::Chrome => {
                let mut caps = DesiredCapabilities::chrome();
                if headless {
                    caps.set_headless().map_err(session_err)?;
                }
                WebDriver::new(server_url, caps).await
            }
        }
        .map_err(session_err)?;

        info!(elapsed_ms = t0.elapsed().as_millis() as u64, "Browser session started");
        Ok(Self { driver })
    }

    async fn find(&self, locator: &Locator) -> Result<WebElement, BrowserError> {
        self.driver.find(by(locator)).await.map_err(|e| {
            debug!(%locator, error = %e, "Lookup failed");
            BrowserError::not_found(locator)
        })
    }
}

impl Browser for WebDriverSession {
    #[instrument(level = "debug", skip(self))]
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        self.driver.goto(url).await.map_err(session_err)
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        self.driver.source().await.map_err(session_err)
    }

    async fn is_present(&mut self, locator: &Locator) -> Result<bool, BrowserError> {
        let found = self.driver.find_all(by(locator)).await.map_err(session_err)?;
        Ok(!found.is_empty())
    }

    async fn type_into(&mut self, locator: &Locator, text: &str) -> Result<(), BrowserError> {
        let element = self.find(locator).await?;
        element.send_keys(text).await.map_err(session_err)
    }

    async fn click(&mut self, locator: &Locator) -> Result<(), BrowserError> {
        let element = self.find(locator).await?;
        element.click().await.map_err(session_err)
    }

    async fn script_click(&mut self, locator: &Locator) -> Result<(), BrowserError> {
        let element = self.find(locator).await?;
        let arg = element.to_json().map_err(session_err)?;
        self.driver
            .execute("arguments[0].scrollIntoView();", vec![arg.clone()])
            .await
            .map_err(session_err)?;
        self.driver
            .execute("arguments[0].click();", vec![arg])
            .await
            .map_err(session_err)?;
        Ok(())
    }

    async fn wait_and_click(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let element = self
            .driver
            .query(by(locator))
            .wait(timeout, Duration::from_millis(250))
            .first()
            .await
            .map_err(|e| {
                debug!(%locator, error = %e, "Wait for element failed");
                BrowserError::Timeout {
                    locator: locator.to_string(),
                    waited: timeout,
                }
            })?;
        element.click().await.map_err(session_err)
    }

    async fn set_implicit_wait(&mut self, wait: Duration) -> Result<(), BrowserError> {
        self.driver
            .set_implicit_wait_timeout(wait)
            .await
            .map_err(session_err)
    }

    async fn close(self) -> Result<(), BrowserError> {
        match self.driver.quit().await {
            Ok(()) => {
                info!("Browser session closed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Browser session did not close cleanly");
                Err(session_err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_the_locator() {
        let err = BrowserError::not_found(&Locator::Id("username".to_string()));
        assert_eq!(err.to_string(), "element not found: id=username");
    }

    #[test]
    fn test_timeout_message() {
        let err = BrowserError::Timeout {
            locator: "xpath=//a".to_string(),
            waited: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "timed out after 5s waiting for xpath=//a");
    }
}
