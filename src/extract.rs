//! Article content extraction.
//!
//! Fetches the chosen article page and delegates the hard part to the
//! `readability` crate, which strips navigation, ads, comments, and other
//! boilerplate from the main text. Metadata (title, author, date) comes from
//! the page's Open Graph and `<meta>` tags, with readability's own title as
//! a fallback. Every metadata field the page doesn't expose is normalized to
//! `""` so downstream stages never see an absent field.

use crate::models::{Article, StageOutcome};
use crate::scorer::BROWSER_UA;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::io::Cursor;
use tracing::{info, instrument, warn};
use url::Url;

static OG_TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static AUTHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="author"]"#).unwrap());
static ARTICLE_AUTHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="article:author"]"#).unwrap());
static PUBLISHED_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="article:published_time"]"#).unwrap());
static DATE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"meta[name="date"]"#).unwrap());
static TIME_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("time[datetime]").unwrap());

// Article fetches deliberately get no explicit timeout; they ride on the
// client library's defaults.
static ARTICLE_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(BROWSER_UA)
        .build()
        .unwrap()
});

/// Fetch an article page and extract its content and metadata.
///
/// # Returns
///
/// - [`StageOutcome::Found`] with the extracted [`Article`] (`pill` unset)
/// - [`StageOutcome::Empty`] when the page yields no usable text (paywalled,
///   malformed, or boilerplate-only pages)
/// - [`StageOutcome::Failed`] when the download itself fails
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_article(url: &str) -> StageOutcome<Article> {
    let parsed_url = match Url::parse(url) {
        Ok(u) => u,
        Err(e) => return StageOutcome::Failed(format!("invalid article URL {url}: {e}")),
    };

    let bytes = match download(&parsed_url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Could not download article");
            return StageOutcome::Failed(e);
        }
    };

    let raw_html = String::from_utf8_lossy(&bytes).into_owned();
    let mut reader = Cursor::new(bytes);
    let product = match readability::extractor::extract(&mut reader, &parsed_url) {
        Ok(product) => product,
        Err(e) => {
            warn!(error = %e, "Could not parse article");
            return StageOutcome::Empty;
        }
    };

    let text = product.text.trim().to_string();
    if text.is_empty() {
        warn!("Article page produced no usable text");
        return StageOutcome::Empty;
    }

    let meta = page_metadata(&raw_html);
    let article = Article {
        title: meta.title.unwrap_or(product.title).trim().to_string(),
        author: meta.author.unwrap_or_default(),
        date: meta.date.unwrap_or_default(),
        text,
        url: url.to_string(),
        pill: None,
    };

    info!(
        bytes = article.text.len(),
        title = %article.title,
        "Extracted article"
    );
    StageOutcome::Found(article)
}

async fn download(url: &Url) -> Result<Vec<u8>, String> {
    let response = ARTICLE_CLIENT
        .get(url.clone())
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("article fetch returned {status}"));
    }
    response
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| e.to_string())
}

/// Page-level metadata pulled from `<meta>` and `<time>` tags.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
}

/// Extract title/author/date hints from the raw page markup.
pub fn page_metadata(html: &str) -> PageMeta {
    let document = Html::parse_document(html);

    let title = meta_content(&document, &OG_TITLE_SELECTOR);
    let author = meta_content(&document, &AUTHOR_SELECTOR)
        .or_else(|| meta_content(&document, &ARTICLE_AUTHOR_SELECTOR));
    let date = meta_content(&document, &PUBLISHED_SELECTOR)
        .or_else(|| meta_content(&document, &DATE_SELECTOR))
        .or_else(|| {
            document
                .select(&TIME_SELECTOR)
                .next()
                .and_then(|el| el.value().attr("datetime"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        });

    PageMeta {
        title,
        author,
        date,
    }
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
