//! Site profile: every URL, control locator, and field selector the scraper
//! depends on.
//!
//! Site markup drifts. Keeping the selectors in a versioned profile means a
//! markup change is a YAML edit rather than a code change. The built-in
//! [`SiteProfile::default`] targets the rateyourmusic.com "latest" listing;
//! a YAML file passed with `--profile` overrides any subset of it.
//!
//! # Example
//!
//! ```yaml
//! version: 1
//! listing_url: https://rateyourmusic.com/latest?offset=30
//! layout:
//!   mode: blocks
//!   container: div.review
//! fields:
//!   date: span.date
//! controls:
//!   next_page:
//!     by: xpath
//!     value: "//*[contains(text(), 'Next 15')]"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Profile schema version understood by this build.
pub const PROFILE_VERSION: u32 = 1;

const LATEST_URL: &str = "https://rateyourmusic.com/latest?offset=2010";
const LISTING_URL: &str = "https://rateyourmusic.com/latest?offset=15";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse profile: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported profile version {found} (expected {})", PROFILE_VERSION)]
    Version { found: u32 },
    #[error("invalid selector for {field} ({selector:?}): {reason}")]
    Selector {
        field: &'static str,
        selector: String,
        reason: String,
    },
}

/// How an element is located in the live browser session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Locator {
    Id(String),
    Css(String),
    #[serde(rename = "xpath")]
    XPath(String),
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "id={id}"),
            Locator::Css(css) => write!(f, "css={css}"),
            Locator::XPath(xpath) => write!(f, "xpath={xpath}"),
        }
    }
}

/// Locators and waits for the controls the pager interacts with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Controls {
    pub username: Locator,
    pub password: Locator,
    pub login_submit: Locator,
    /// The "[+all reviews]" link.
    pub expand_reviews: Locator,
    /// The "Next 15" pagination control.
    pub next_page: Locator,
    /// Implicit wait applied to the session after logging in.
    pub implicit_wait_secs: u64,
    /// How long to wait for the next-page control to appear.
    pub next_page_wait_secs: u64,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            username: Locator::Id("username".to_string()),
            password: Locator::Id("password".to_string()),
            login_submit: Locator::Id("login_submit".to_string()),
            expand_reviews: Locator::XPath("//a[contains(text(), '[+all reviews]')]".to_string()),
            next_page: Locator::XPath("//*[contains(text(), 'Next 15')]".to_string()),
            implicit_wait_secs: 10,
            next_page_wait_secs: 5,
        }
    }
}

/// CSS selectors for each extracted field.
///
/// In block layout these are evaluated relative to each review container;
/// in positional layout they run over the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FieldSelectors {
    /// Inline text element directly under a paragraph that carries a class.
    pub review: String,
    pub album: String,
    pub artist: String,
    /// Paragraph directly under a table cell without `colspan`.
    pub rating: String,
    /// Image inside the rating element whose `title` holds the rating.
    pub rating_image: String,
    pub date: String,
    pub username: String,
}

impl Default for FieldSelectors {
    fn default() -> Self {
        Self {
            review: "p > span[class]".to_string(),
            album: "a.album".to_string(),
            artist: "a.artist".to_string(),
            rating: "td:not([colspan]) > p".to_string(),
            rating_image: "img".to_string(),
            date: "div.small".to_string(),
            username: "a.user".to_string(),
        }
    }
}

/// How extracted fields are grouped into rows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Layout {
    /// One row per container element; fields are read inside the container.
    /// Opt-in: the container selector depends on how the listing wraps reviews.
    Blocks { container: String },
    /// Fields are selected document-wide and zipped by position.
    Positional,
}

impl Default for Layout {
    fn default() -> Self {
        Layout::Positional
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteProfile {
    pub version: u32,
    /// Landing page that carries the login form and the expand link.
    pub latest_url: Url,
    /// First page of the paginated review listing.
    pub listing_url: Url,
    pub layout: Layout,
    pub fields: FieldSelectors,
    pub controls: Controls,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            version: PROFILE_VERSION,
            latest_url: Url::parse(LATEST_URL).expect("static latest url"),
            listing_url: Url::parse(LISTING_URL).expect("static listing url"),
            layout: Layout::default(),
            fields: FieldSelectors::default(),
            controls: Controls::default(),
        }
    }
}

impl SiteProfile {
    /// Parse a profile from YAML. Missing keys fall back to the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ProfileError> {
        let profile: SiteProfile = serde_yaml::from_str(yaml)?;
        if profile.version != PROFILE_VERSION {
            return Err(ProfileError::Version {
                found: profile.version,
            });
        }
        Ok(profile)
    }

    /// Load a profile from a YAML file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, ProfileError> {
        let yaml = fs::read_to_string(path)
            .await
            .map_err(|source| ProfileError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let profile = Self::from_yaml(&yaml)?;
        info!(version = profile.version, layout = ?profile.layout, "Loaded site profile");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_targets_latest_listing() {
        let profile = SiteProfile::default();
        assert_eq!(profile.version, PROFILE_VERSION);
        assert_eq!(profile.latest_url.as_str(), LATEST_URL);
        assert_eq!(profile.listing_url.as_str(), LISTING_URL);
        assert_eq!(profile.controls.username, Locator::Id("username".to_string()));
        assert_eq!(profile.fields.album, "a.album");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
version: 1
listing_url: https://rateyourmusic.com/latest?offset=30
fields:
  date: span.date
controls:
  next_page:
    by: xpath
    value: "//a[text()='Next']"
"#;
        let profile = SiteProfile::from_yaml(yaml).unwrap();
        assert_eq!(
            profile.listing_url.as_str(),
            "https://rateyourmusic.com/latest?offset=30"
        );
        assert_eq!(profile.fields.date, "span.date");
        assert_eq!(profile.fields.album, "a.album");
        assert_eq!(
            profile.controls.next_page,
            Locator::XPath("//a[text()='Next']".to_string())
        );
        assert_eq!(profile.controls.next_page_wait_secs, 5);
        assert_eq!(profile.layout, Layout::default());
    }

    #[test]
    fn test_block_layout_is_opt_in() {
        assert_eq!(SiteProfile::default().layout, Layout::Positional);

        let yaml = "layout:\n  mode: blocks\n  container: div.review\n";
        let profile = SiteProfile::from_yaml(yaml).unwrap();
        assert_eq!(
            profile.layout,
            Layout::Blocks {
                container: "div.review".to_string()
            }
        );
    }

    #[test]
    fn test_serialized_default_parses_back() {
        let yaml = serde_yaml::to_string(&SiteProfile::default()).unwrap();
        assert_eq!(SiteProfile::from_yaml(&yaml).unwrap(), SiteProfile::default());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let err = SiteProfile::from_yaml("version: 7\n").unwrap_err();
        assert!(matches!(err, ProfileError::Version { found: 7 }));
    }

    #[test]
    fn test_rejects_bad_url() {
        let err = SiteProfile::from_yaml("latest_url: not a url\n").unwrap_err();
        assert!(matches!(err, ProfileError::Yaml(_)));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = SiteProfile::load(Path::new("/definitely/not/here.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::Io { .. }));
    }

    #[test]
    fn test_locator_display() {
        assert_eq!(Locator::Id("password".into()).to_string(), "id=password");
        assert_eq!(
            Locator::XPath("//a".into()).to_string(),
            "xpath=//a"
        );
    }
}
