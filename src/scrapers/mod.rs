//! Page scrapers for the review listing.
//!
//! The extraction side of the scraper is a pure function of the rendered
//! page: it never touches the browser session.
//!
//! # Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`reviews`] | Locates review fields in the listing markup and assembles rows |
//! | [`language`] | Identifies the language each review is written in |

pub mod language;
pub mod reviews;
