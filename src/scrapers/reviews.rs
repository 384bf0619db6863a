//! Review extraction from a rendered listing page.
//!
//! The listing markup is loosely structured, so every field is located by its
//! own structural selector (see [`FieldSelectors`]). Rows are then assembled
//! in one of two ways, chosen by the profile's [`Layout`]:
//!
//! - **Blocks**: each review container yields one row, with every field read
//!   inside that container. A missing field costs one blank cell, never a
//!   shifted column.
//! - **Positional**: each field is collected across the whole document and the
//!   lists are zipped. Output length is the shortest list, so one missing date
//!   silently drops (or misaligns) rows.

use crate::models::{NO_RATING, ReviewRow};
use crate::profile::{FieldSelectors, Layout, ProfileError, SiteProfile};
use crate::scrapers::language::detect_language;
use crate::utils::{strip_tags, truncate_for_log};
use itertools::izip;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};

/// Field lists collected document-wide, before positional assembly.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldLists {
    pub artists: Vec<String>,
    pub albums: Vec<String>,
    pub reviews: Vec<String>,
    pub dates: Vec<String>,
    pub ratings: Vec<String>,
    pub usernames: Vec<String>,
}

impl FieldLists {
    fn lengths(&self) -> [usize; 6] {
        [
            self.artists.len(),
            self.albums.len(),
            self.reviews.len(),
            self.dates.len(),
            self.ratings.len(),
            self.usernames.len(),
        ]
    }
}

#[derive(Debug, Clone)]
struct CompiledFields {
    review: Selector,
    album: Selector,
    artist: Selector,
    rating: Selector,
    rating_image: Selector,
    date: Selector,
    username: Selector,
}

#[derive(Debug, Clone)]
enum CompiledLayout {
    Blocks(Selector),
    Positional,
}

/// Extracts [`ReviewRow`]s from a rendered listing page.
///
/// Built once from a [`SiteProfile`]; all selectors are parsed up front so an
/// invalid profile fails before the browser session starts.
#[derive(Debug, Clone)]
pub struct ReviewExtractor {
    fields: CompiledFields,
    layout: CompiledLayout,
}

fn compile(field: &'static str, css: &str) -> Result<Selector, ProfileError> {
    Selector::parse(css).map_err(|e| ProfileError::Selector {
        field,
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

impl ReviewExtractor {
    pub fn new(profile: &SiteProfile) -> Result<Self, ProfileError> {
        let FieldSelectors {
            review,
            album,
            artist,
            rating,
            rating_image,
            date,
            username,
        } = &profile.fields;

        let fields = CompiledFields {
            review: compile("review", review)?,
            album: compile("album", album)?,
            artist: compile("artist", artist)?,
            rating: compile("rating", rating)?,
            rating_image: compile("rating_image", rating_image)?,
            date: compile("date", date)?,
            username: compile("username", username)?,
        };
        let layout = match &profile.layout {
            Layout::Blocks { container } => CompiledLayout::Blocks(compile("container", container)?),
            Layout::Positional => CompiledLayout::Positional,
        };

        Ok(Self { fields, layout })
    }

    /// Parse `source` and extract every review on the page.
    pub fn extract_source(&self, source: &str) -> Vec<ReviewRow> {
        let document = Html::parse_document(source);
        self.extract(&document)
    }

    /// Extract every review in `document`. Returns an empty list when the page
    /// has no matching markup.
    #[instrument(level = "debug", skip_all)]
    pub fn extract(&self, document: &Html) -> Vec<ReviewRow> {
        let rows = match &self.layout {
            CompiledLayout::Blocks(container) => document
                .select(container)
                .filter_map(|block| self.extract_block(block))
                .collect::<Vec<_>>(),
            CompiledLayout::Positional => assemble_positional(self.collect_fields(document)),
        };
        debug!(count = rows.len(), "Extracted reviews");
        rows
    }

    fn extract_block(&self, block: ElementRef<'_>) -> Option<ReviewRow> {
        let f = &self.fields;
        let Some(review_text) = block.select(&f.review).next().map(stripped_text) else {
            debug!(
                block = %truncate_for_log(&block.html(), 120),
                "Container has no review text; skipping"
            );
            return None;
        };
        let first_text = |sel: &Selector| block.select(sel).next().map(verbatim_text).unwrap_or_default();

        Some(ReviewRow {
            artist: first_text(&f.artist),
            album: first_text(&f.album),
            date: block
                .select(&f.date)
                .next()
                .map(stripped_text)
                .unwrap_or_default(),
            rating: block
                .select(&f.rating)
                .next()
                .map(|el| self.rating(el))
                .unwrap_or_else(|| NO_RATING.to_string()),
            username: first_text(&f.username),
            detected_language: detect_language(&review_text),
            review_text,
        })
    }

    /// Collect each field independently across the whole document.
    pub fn collect_fields(&self, document: &Html) -> FieldLists {
        let f = &self.fields;
        FieldLists {
            artists: document.select(&f.artist).map(verbatim_text).collect(),
            albums: document.select(&f.album).map(verbatim_text).collect(),
            reviews: document.select(&f.review).map(stripped_text).collect(),
            dates: document.select(&f.date).map(stripped_text).collect(),
            ratings: document.select(&f.rating).map(|el| self.rating(el)).collect(),
            usernames: document.select(&f.username).map(verbatim_text).collect(),
        }
    }

    fn rating(&self, element: ElementRef<'_>) -> String {
        element
            .select(&self.fields.rating_image)
            .next()
            .and_then(|img| img.value().attr("title"))
            .map(str::to_string)
            .unwrap_or_else(|| NO_RATING.to_string())
    }
}

/// Zip document-wide field lists into rows by position.
///
/// Output length is the length of the shortest list. A mismatch is logged but
/// not corrected.
pub fn assemble_positional(fields: FieldLists) -> Vec<ReviewRow> {
    let lengths = fields.lengths();
    if lengths.iter().any(|&n| n != lengths[0]) {
        warn!(
            artists = lengths[0],
            albums = lengths[1],
            reviews = lengths[2],
            dates = lengths[3],
            ratings = lengths[4],
            usernames = lengths[5],
            "Field counts differ; rows truncated to the shortest list"
        );
    }

    let FieldLists {
        artists,
        albums,
        reviews,
        dates,
        ratings,
        usernames,
    } = fields;

    izip!(artists, albums, reviews, dates, ratings, usernames)
        .map(|(artist, album, review_text, date, rating, username)| ReviewRow {
            detected_language: detect_language(&review_text),
            artist,
            album,
            review_text,
            date,
            rating,
            username,
        })
        .collect()
}

fn verbatim_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Serialized markup with each tag replaced by a space. Surrounding
/// whitespace is kept.
fn stripped_text(element: ElementRef<'_>) -> String {
    strip_tags(&element.html())
}
