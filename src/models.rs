//! Data models for the scraping and summarization pipeline.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Candidate`]: A scored "top article" link pulled from a homepage
//! - [`Article`]: Extracted article content and metadata
//! - [`Edition`]: The per-site collection of selected articles
//! - [`StageOutcome`]: Explicit success/empty/failure result for a pipeline stage
//!
//! Metadata fields on [`Article`] are always present as strings; anything the
//! extractor cannot find is normalized to `""` rather than left absent.

use serde::{Deserialize, Serialize};

/// A scored, prospective "top article" link extracted from a homepage.
///
/// Candidates are transient: they exist only between the homepage scan and
/// the relevance ranking. The same URL may appear more than once when a link
/// satisfies several scoring rules; callers must not assume uniqueness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Fixed-weight heuristic score (80, 70, 60, or 50).
    pub score: u32,
    /// The link target, already resolved to an absolute URL.
    pub url: String,
    /// The link's visible text.
    pub title: String,
}

/// An extracted news article.
///
/// Created by the extractor with `pill` unset; [`Article::with_pill`] attaches
/// the one-sentence highlight exactly once, after which the article is
/// read-only for rendering.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Article {
    /// Headline, or `""` when the page exposes none.
    pub title: String,
    /// Byline, or `""`.
    pub author: String,
    /// Publication date as found on the page, or `""`.
    pub date: String,
    /// Main body text with navigation and boilerplate stripped.
    pub text: String,
    /// The article's absolute URL.
    pub url: String,
    /// One-sentence AI highlight, set once by the summarization stage.
    pub pill: Option<String>,
}

impl Article {
    /// Attach the generated pill, consuming the article so it happens once.
    pub fn with_pill(self, pill: String) -> Article {
        Article {
            pill: Some(pill),
            ..self
        }
    }
}

/// One edition of the paper: each configured site's selected article, in the
/// order the sites were processed.
///
/// Inserting an article for a site that is already present replaces the
/// article but keeps the site's original position, matching the
/// last-write-wins contract for a site that is somehow processed twice.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Edition {
    entries: Vec<(String, Article)>,
}

impl Edition {
    pub fn new() -> Edition {
        Edition::default()
    }

    /// Insert or replace the article selected for `site`.
    pub fn insert(&mut self, site: String, article: Article) {
        if let Some(entry) = self.entries.iter_mut().find(|(s, _)| *s == site) {
            entry.1 = article;
        } else {
            self.entries.push((site, article));
        }
    }

    /// Sites and articles in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Article)> {
        self.entries.iter().map(|(s, a)| (s.as_str(), a))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Edition {
    type Item = (String, Article);
    type IntoIter = std::vec::IntoIter<(String, Article)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, Article)> for Edition {
    fn from_iter<I: IntoIterator<Item = (String, Article)>>(iter: I) -> Edition {
        let mut edition = Edition::new();
        for (site, article) in iter {
            edition.insert(site, article);
        }
        edition
    }
}

/// Explicit result of a pipeline stage.
///
/// The pipeline needs to tell "the stage ran and found nothing" apart from
/// "the stage errored out", so stages return this instead of an `Option`.
/// Both non-`Found` variants mean "skip this site", but they are logged and
/// reported differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome<T> {
    /// The stage produced a usable value.
    Found(T),
    /// The stage completed but there was nothing to work with.
    Empty,
    /// The stage failed; the payload is a diagnostic message.
    Failed(String),
}
