//! Homepage link scoring: find the candidate "top article" links on a
//! news site's front page.
//!
//! The scan makes four passes over the document, each with a fixed priority
//! score:
//!
//! 1. Links inside an `<article>` container with visible text over 30
//!    characters score 80.
//! 2. Links inside an `<h1>` with visible text over 30 characters score 70.
//! 3. Links inside an `<h2>` or `<h3>` with visible text over 30 characters
//!    score 60.
//! 4. Any link anywhere with visible text over 40 characters scores 50.
//!
//! A link that satisfies several rules is emitted once per rule; duplicates
//! are left in on purpose so the ranking stage sees the candidate list the
//! scan produced. All hrefs are resolved against the homepage URL, so every
//! candidate carries an absolute URL.

use crate::models::{Candidate, StageOutcome};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

const SCORE_ARTICLE: u32 = 80;
const SCORE_H1: u32 = 70;
const SCORE_SUBHEAD: u32 = 60;
const SCORE_LONG_LINK: u32 = 50;

/// Minimum visible text length for links nested in article/heading containers.
const NESTED_TEXT_MIN: usize = 30;
/// Minimum visible text length for the catch-all link rule.
const LONG_TEXT_MIN: usize = 40;

/// Homepage fetches get a strict deadline; a slow site only costs 10 seconds.
const HOMEPAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Some homepages serve bot-targeted stubs to unknown agents; both scraping
/// clients identify as a desktop browser.
pub(crate) const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) \
Chrome/122.0 Safari/537.36";

static ARTICLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static H2_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static H3_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h3").unwrap());
static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

static HOMEPAGE_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(BROWSER_UA)
        .timeout(HOMEPAGE_TIMEOUT)
        .build()
        .unwrap()
});

/// Fetch a site's homepage and return its top-k candidate links.
///
/// # Returns
///
/// - [`StageOutcome::Found`] with up to `k` candidates, best score first
/// - [`StageOutcome::Empty`] when the page has no qualifying links
/// - [`StageOutcome::Failed`] on a network error or non-success status
#[instrument(level = "info", skip_all, fields(site = %site_url))]
pub async fn fetch_top_candidates(site_url: &str, k: usize) -> StageOutcome<Vec<Candidate>> {
    let base_url = match Url::parse(site_url) {
        Ok(url) => url,
        Err(e) => return StageOutcome::Failed(format!("invalid site URL {site_url}: {e}")),
    };

    let html = match fetch_homepage(&base_url).await {
        Ok(html) => html,
        Err(e) => {
            warn!(error = %e, "Homepage fetch failed");
            return StageOutcome::Failed(e.to_string());
        }
    };

    let candidates = scan_homepage(&html, &base_url);
    if candidates.is_empty() {
        info!("No article links found on homepage");
        return StageOutcome::Empty;
    }

    let top = top_candidates(candidates, k);
    info!(
        count = top.len(),
        best_score = top[0].score,
        best_title = %top[0].title,
        "Selected candidate links"
    );
    StageOutcome::Found(top)
}

async fn fetch_homepage(base_url: &Url) -> Result<String, Box<dyn Error>> {
    let response = HOMEPAGE_CLIENT.get(base_url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("homepage fetch returned {status}").into());
    }
    Ok(response.text().await?)
}

/// Scan homepage markup for candidate links, in rule order.
///
/// Pure function over already-fetched markup; candidates come back in scan
/// order, unsorted. Hrefs that cannot be resolved against `base_url` are
/// dropped.
pub fn scan_homepage(html: &str, base_url: &Url) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    let mut candidates = Vec::new();

    for container in document.select(&ARTICLE_SELECTOR) {
        push_nested_link(&mut candidates, base_url, container, SCORE_ARTICLE);
    }

    for (selector, score) in [
        (&*H1_SELECTOR, SCORE_H1),
        (&*H2_SELECTOR, SCORE_SUBHEAD),
        (&*H3_SELECTOR, SCORE_SUBHEAD),
    ] {
        for heading in document.select(selector) {
            push_nested_link(&mut candidates, base_url, heading, score);
        }
    }

    for anchor in document.select(&ANCHOR_SELECTOR) {
        let text = visible_text(anchor);
        if text.chars().count() > LONG_TEXT_MIN {
            push_candidate(&mut candidates, base_url, anchor, SCORE_LONG_LINK, text);
        }
    }

    debug!(count = candidates.len(), "Scanned homepage for candidates");
    candidates
}

/// Emit the first qualifying link nested inside `container`.
fn push_nested_link(
    candidates: &mut Vec<Candidate>,
    base_url: &Url,
    container: ElementRef<'_>,
    score: u32,
) {
    if let Some(anchor) = container.select(&ANCHOR_SELECTOR).next() {
        let text = visible_text(anchor);
        if text.chars().count() > NESTED_TEXT_MIN {
            push_candidate(candidates, base_url, anchor, score, text);
        }
    }
}

fn push_candidate(
    candidates: &mut Vec<Candidate>,
    base_url: &Url,
    anchor: ElementRef<'_>,
    score: u32,
    title: String,
) {
    let Some(href) = anchor.value().attr("href") else {
        return;
    };
    if let Ok(resolved) = base_url.join(href) {
        candidates.push(Candidate {
            score,
            url: resolved.to_string(),
            title,
        });
    }
}

/// The anchor's visible text: text nodes trimmed and joined with a space.
fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sort candidates best-first and keep the top `k`.
///
/// The sort is stable, so equal-score candidates keep their scan order.
pub fn top_candidates(mut candidates: Vec<Candidate>, k: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates.truncate(k);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://x.com").unwrap()
    }

    fn text_of_len(n: usize) -> String {
        "a".repeat(n)
    }

    #[test]
    fn test_no_qualifying_links_yields_empty() {
        let html = r#"<html><body><p>No links here</p><a href="/short">tiny</a></body></html>"#;
        assert!(scan_homepage(html, &base()).is_empty());
    }

    #[test]
    fn test_article_link_over_threshold_scores_80() {
        let html = format!(
            r#"<article><a href="/a/b">{}</a></article>"#,
            text_of_len(31)
        );
        let candidates = scan_homepage(&html, &base());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].score, 80);
        assert_eq!(candidates[0].title.chars().count(), 31);
    }

    #[test]
    fn test_article_link_at_exactly_30_chars_is_excluded() {
        // 30 chars fails the nested rule and is too short for the 40-char
        // generic rule, so nothing is emitted at all.
        let html = format!(
            r#"<article><a href="/a/b">{}</a></article>"#,
            text_of_len(30)
        );
        assert!(scan_homepage(&html, &base()).is_empty());
    }

    #[test]
    fn test_heading_links_score_by_rank() {
        let html = format!(
            r#"<h1><a href="/one">{t}</a></h1>
               <h2><a href="/two">{t}</a></h2>
               <h3><a href="/three">{t}</a></h3>"#,
            t = text_of_len(35)
        );
        let candidates = scan_homepage(&html, &base());
        let scores: Vec<u32> = candidates.iter().map(|c| c.score).collect();
        assert_eq!(scores, vec![70, 60, 60]);
    }

    #[test]
    fn test_long_link_also_matches_generic_rule_duplicates_kept() {
        // 45 chars satisfies both the article rule (80) and the generic
        // long-link rule (50); both entries stay in the list.
        let html = format!(
            r#"<article><a href="/story">{}</a></article>"#,
            text_of_len(45)
        );
        let candidates = scan_homepage(&html, &base());
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].score, 80);
        assert_eq!(candidates[1].score, 50);
        assert_eq!(candidates[0].url, candidates[1].url);
    }

    #[test]
    fn test_generic_rule_at_exactly_40_chars_is_excluded() {
        let html = format!(r#"<p><a href="/story">{}</a></p>"#, text_of_len(40));
        assert!(scan_homepage(&html, &base()).is_empty());
    }

    #[test]
    fn test_relative_hrefs_resolved_to_absolute() {
        let html = format!(
            r#"<article><a href="/a/b">{}</a></article>"#,
            text_of_len(31)
        );
        let candidates = scan_homepage(&html, &base());
        assert_eq!(candidates[0].url, "https://x.com/a/b");
    }

    #[test]
    fn test_absolute_hrefs_pass_through() {
        let html = format!(
            r#"<article><a href="https://other.org/story">{}</a></article>"#,
            text_of_len(31)
        );
        let candidates = scan_homepage(&html, &base());
        assert_eq!(candidates[0].url, "https://other.org/story");
    }

    #[test]
    fn test_sort_is_score_descending_and_stable() {
        let html = format!(
            r#"<p><a href="/first">{t1}</a></p>
               <article><a href="/top">{t2}</a></article>
               <p><a href="/second">{t3}</a></p>"#,
            t1 = "b".repeat(41),
            t2 = "c".repeat(31),
            t3 = "d".repeat(41),
        );
        let candidates = top_candidates(scan_homepage(&html, &base()), 10);
        assert_eq!(candidates[0].url, "https://x.com/top");
        // equal-score candidates keep scan order
        assert_eq!(candidates[1].url, "https://x.com/first");
        assert_eq!(candidates[2].url, "https://x.com/second");
    }

    #[test]
    fn test_top_candidates_truncates_to_k() {
        let html = format!(
            r#"<h2><a href="/1">{t}</a></h2>
               <h2><a href="/2">{t}</a></h2>
               <h2><a href="/3">{t}</a></h2>"#,
            t = text_of_len(35)
        );
        let candidates = top_candidates(scan_homepage(&html, &base()), 2);
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn test_single_article_link_end_to_end_shape() {
        // The homepage has exactly one <article> link with 35-char text and
        // nothing else: one candidate, score 80, absolute URL.
        let html = format!(
            r#"<html><body><article><a href="/breaking">{}</a></article></body></html>"#,
            text_of_len(35)
        );
        let candidates = top_candidates(scan_homepage(&html, &base()), 5);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].score, 80);
        assert_eq!(candidates[0].url, "https://x.com/breaking");
    }

    #[test]
    fn test_nested_markup_inside_anchor_counts_as_visible_text() {
        let html = r#"<article><a href="/s"><span>Breaking:</span> <b>a long headline about events</b></a></article>"#;
        let candidates = scan_homepage(html, &base());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Breaking: a long headline about events");
    }
}
