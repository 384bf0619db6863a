//! Data models for scraped reviews and the outcomes of a scraping session.
//!
//! This module defines the core data structures used throughout the application:
//! - [`ReviewRow`]: One review and its metadata, as written to the CSV output
//! - [`AuthOutcome`] / [`ExpandOutcome`]: Results of the best-effort session steps
//! - [`Advance`]: Result of trying to move to the next listing page
//! - [`RunSummary`]: Counters collected over one pagination run

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder written when a review carries no rating image.
pub const NO_RATING: &str = "no_rating";

/// Placeholder written when the language of a review cannot be identified.
pub const UNDETERMINED_LANGUAGE: &str = "und";

/// A single review scraped from the listing page.
///
/// Field order is the CSV column order: artist, album, review text, date,
/// rating, username, detected language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReviewRow {
    /// The artist credited on the reviewed release.
    pub artist: String,
    /// The reviewed release.
    pub album: String,
    /// The review body with markup removed.
    pub review_text: String,
    /// The date line shown next to the review.
    pub date: String,
    /// The rating image title (e.g. `"3.50 stars"`) or [`NO_RATING`].
    pub rating: String,
    /// The reviewer's username.
    pub username: String,
    /// ISO-639 code of the review language or [`UNDETERMINED_LANGUAGE`].
    pub detected_language: String,
}

/// Result of the best-effort login step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Credentials were typed and the form submitted.
    Authenticated,
    /// At least one of the login controls was not on the page.
    SkippedNoControls,
    /// The secret source had no credentials to offer.
    SkippedNoCredentials,
    /// The controls were found but interacting with them failed.
    Failed(String),
}

impl AuthOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthOutcome::Authenticated)
    }
}

impl fmt::Display for AuthOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthOutcome::Authenticated => write!(f, "authenticated"),
            AuthOutcome::SkippedNoControls => write!(f, "skipped (login controls not found)"),
            AuthOutcome::SkippedNoCredentials => write!(f, "skipped (no credentials)"),
            AuthOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Result of the best-effort "expand all reviews" step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandOutcome {
    Expanded,
    SkippedNoControl,
    Failed(String),
}

impl fmt::Display for ExpandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpandOutcome::Expanded => write!(f, "expanded"),
            ExpandOutcome::SkippedNoControl => write!(f, "skipped (link not found)"),
            ExpandOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Result of clicking the "next page" control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Advanced,
    /// The control never became available; the browser is still on the same page.
    Stalled(String),
}

/// Counters collected over one run of the pager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub pages_scraped: usize,
    pub rows_written: usize,
    /// Pages that were captured but contained no extractable reviews.
    pub empty_pages: usize,
    /// Iterations where the "next page" click failed.
    pub stalls: usize,
    /// Whether the loop stopped early because the listing stopped advancing.
    pub aborted_on_stalls: bool,
    pub auth: AuthOutcome,
}

impl RunSummary {
    pub fn new(auth: AuthOutcome) -> Self {
        Self {
            pages_scraped: 0,
            rows_written: 0,
            empty_pages: 0,
            stalls: 0,
            aborted_on_stalls: false,
            auth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_row_column_order() {
        let row = ReviewRow {
            artist: "Radiohead".to_string(),
            album: "OK Computer".to_string(),
            review_text: "Great".to_string(),
            date: "Jan 1 2020".to_string(),
            rating: "4.50 stars".to_string(),
            username: "someone".to_string(),
            detected_language: "en".to_string(),
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(vec![]);
        writer.serialize(&row).unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(
            out.trim_end(),
            "Radiohead,OK Computer,Great,Jan 1 2020,4.50 stars,someone,en"
        );
    }

    #[test]
    fn test_auth_outcome_display() {
        assert_eq!(AuthOutcome::Authenticated.to_string(), "authenticated");
        assert_eq!(
            AuthOutcome::Failed("boom".to_string()).to_string(),
            "failed: boom"
        );
        assert!(AuthOutcome::Authenticated.is_authenticated());
        assert!(!AuthOutcome::SkippedNoControls.is_authenticated());
    }

    #[test]
    fn test_run_summary_starts_empty() {
        let summary = RunSummary::new(AuthOutcome::SkippedNoCredentials);
        assert_eq!(summary.pages_scraped, 0);
        assert_eq!(summary.rows_written, 0);
        assert!(!summary.aborted_on_stalls);
    }
}
