//! Utility functions for markup stripping, log formatting, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Tag stripping for review and date markup
//! - String truncation for logging previews of scraped text
//! - File system validation for the output file location

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*?>").expect("static tag regex"));

/// Replace every `<...>` span with a single space.
///
/// This is a bracket-matching pass, not an HTML parser: a literal `<` in user
/// text that is later closed by `>` is removed as well. Text without tags is
/// returned unchanged.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(strip_tags("<span>hi</span>"), " hi ");
/// assert_eq!(strip_tags("plain"), "plain");
/// ```
pub fn strip_tags(text: &str) -> String {
    TAG.replace_all(text, " ").into_owned()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut after `max` bytes (backing off to the nearest
/// character boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure the directory that will hold `file` exists and is writable.
///
/// Creates the directory if needed, then performs a write test by creating
/// and immediately deleting a scratch file next to the target.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %file.display()))]
pub async fn ensure_writable_parent(file: &Path) -> Result<(), Box<dyn Error>> {
    let dir = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&dir).await?;

    // Try a small sync write using std fs (simpler error surface)
    let scratch_path = dir.join("..__write_check__");
    match stdfs::File::create(&scratch_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&scratch_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags_replaces_each_tag_with_space() {
        assert_eq!(
            strip_tags(r#"<span class="rendered_text">Loud <b>and</b> proud</span>"#),
            " Loud  and  proud "
        );
    }

    #[test]
    fn test_strip_tags_is_idempotent_on_plain_text() {
        let plain = "No markup here, just 5 > 3 words";
        assert_eq!(strip_tags(plain), plain);

        let once = strip_tags("<p>twice <i>stripped</i></p>");
        assert_eq!(strip_tags(&once), once);
    }

    #[test]
    fn test_strip_tags_eats_literal_angle_brackets() {
        // Known precision gap of the regex approach.
        assert_eq!(strip_tags("a <3 b > c"), "a   c");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let s = "ééééé";
        let result = truncate_for_log(s, 3);
        assert!(result.starts_with("é…"));
        assert!(result.contains("(+8 bytes)"));
    }

    #[tokio::test]
    async fn test_ensure_writable_parent_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("rows.csv");
        ensure_writable_parent(&target).await.unwrap();
        assert!(dir.path().join("nested").is_dir());
    }
}
