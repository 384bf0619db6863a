//! Output generation for scraped reviews.
//!
//! # Submodules
//!
//! - [`csv`]: Appends review rows to a header-less CSV file, one batch per page
//!
//! # Output Format
//!
//! ```text
//! artist,album,review_text,date,rating,username,detected_language
//! ```
//!
//! The column line above is for reference only; no header is ever written, so
//! repeated runs concatenate cleanly into one file.

pub mod csv;
