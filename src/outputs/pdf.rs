//! Newspaper-style PDF rendering.
//!
//! The edition is laid out as a single HTML document — centered masthead,
//! dateline, a shaded "News Pills" digest box, then every article flowing
//! through a multi-column layout — and handed to `printpdf`'s HTML renderer.
//! Each article's title/author/date/URL header is marked `break-inside:
//! avoid` so it never splits across a column or page break, while the body
//! text breaks naturally.
//!
//! Article text and metadata are escaped before interpolation; scraped pages
//! are full of markup-significant characters.

use crate::models::Edition;
use crate::outputs::fonts::FontPair;
use crate::utils::dateline;
use htmlescape::{encode_attribute, encode_minimal};
use printpdf::{Base64OrRaw, GeneratePdfOptions, PdfDocument};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Write;
use tracing::{info, instrument, warn};

/// Presentation knobs threaded in from the CLI.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Masthead title on the front page.
    pub title: String,
    /// Number of text columns per page.
    pub columns: u32,
}

/// Render the edition to PDF bytes.
#[instrument(level = "info", skip_all, fields(articles = edition.len()))]
pub fn render_pdf(
    edition: &Edition,
    fonts: &FontPair,
    opts: &RenderOptions,
) -> Result<Vec<u8>, Box<dyn Error>> {
    let html = build_html(edition, fonts, opts);

    let mut font_map: BTreeMap<String, Base64OrRaw> = BTreeMap::new();
    font_map.insert(fonts.family.clone(), Base64OrRaw::Raw(fonts.regular.clone()));
    font_map.insert(fonts.bold_family(), Base64OrRaw::Raw(fonts.bold.clone()));

    let mut warnings = Vec::new();
    let doc = PdfDocument::from_html(
        &html,
        &BTreeMap::new(),
        &font_map,
        &GeneratePdfOptions::default(),
        &mut warnings,
    )
    .map_err(|e| format!("PDF layout failed: {e}"))?;

    if !warnings.is_empty() {
        warn!(count = warnings.len(), "PDF renderer reported warnings");
    }

    let bytes = doc.save(&Default::default(), &mut warnings);
    info!(bytes = bytes.len(), "Rendered PDF");
    Ok(bytes)
}

/// Build the full HTML document for the edition.
pub fn build_html(edition: &Edition, fonts: &FontPair, opts: &RenderOptions) -> String {
    let mut pills_html = String::new();
    for (_, article) in edition.iter() {
        let pill = article.pill.as_deref().unwrap_or("").trim();
        if !pill.is_empty() {
            let _ = write!(pills_html, "<li>{}</li>", encode_minimal(pill));
        }
    }

    let mut articles_html = String::new();
    for (_, article) in edition.iter() {
        articles_html.push_str(&article_html(article));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<style>
    @page {{
        margin: 0.3cm;
    }}

    body {{
        font-family: '{family}';
        margin: 0;
        padding: 0;
        font-size: 11px;
        line-height: 1.25;
        color: #111;
    }}

    /* newspaper column layout */
    .content {{
        column-count: {columns};
        column-gap: 18px;
        widows: 2;
        orphans: 2;
    }}

    /* Title only on first page */
    #front-title {{
        text-align: center;
        font-family: '{bold_family}';
        font-size: 40px;
        margin-bottom: 2px;
        margin-top: 0;
    }}

    #dateline {{
        text-align: center;
        font-size: 10px;
        color: #555;
        margin-bottom: 12px;
    }}

    /* Pill news block */
    #pill-news {{
        background: #ededed;
        padding: 10px;
        margin-bottom: 20px;
        border-radius: 5px;
    }}

    #pill-news h3 {{
        font-family: '{bold_family}';
        margin-top: 0;
    }}

    article {{
        break-inside: auto;
        margin-bottom: 15px;
        text-align: justify;
    }}

    /* the metadata header never splits across a column break */
    .article-header {{
        break-inside: avoid;
    }}

    h2 {{
        font-family: '{bold_family}';
        font-size: 17px;
        margin-bottom: 4px;
        line-height: 1.1;
    }}

    .meta {{
        font-size: 10px;
        color: #555;
        margin-bottom: 3px;
    }}

    .source-url {{
        font-size: 9px;
        color: #888;
        margin-bottom: 6px;
    }}
</style>
</head>

<body>

    <div class="content">

        <h1 id="front-title">{title}</h1>
        <div id="dateline">{dateline}</div>

        <section id="pill-news">
            <h3>News Pills</h3>
            <ul>{pills}</ul>
        </section>

        {articles}

    </div>

</body>
</html>
"#,
        family = fonts.family,
        bold_family = fonts.bold_family(),
        columns = opts.columns,
        title = encode_minimal(&opts.title),
        dateline = dateline(),
        pills = pills_html,
        articles = articles_html,
    )
}

fn article_html(article: &crate::models::Article) -> String {
    let mut meta = String::new();
    if !article.author.is_empty() {
        let _ = write!(meta, "<strong>{}</strong>", encode_minimal(&article.author));
    }
    if !article.date.is_empty() {
        if !meta.is_empty() {
            meta.push_str(" • ");
        }
        meta.push_str(&encode_minimal(&article.date));
    }
    let meta_html = if meta.is_empty() {
        String::new()
    } else {
        format!(r#"<div class="meta">{meta}</div>"#)
    };

    let mut body = String::new();
    for paragraph in article.text.split("\n\n") {
        let paragraph = paragraph.trim();
        if !paragraph.is_empty() {
            let _ = write!(body, "<p>{}</p>", encode_minimal(paragraph));
        }
    }

    format!(
        r#"<article>
    <div class="article-header">
        <h2>{title}</h2>
        {meta}<div class="source-url"><a href="{href}">{url}</a></div>
    </div>
    {body}
</article>
"#,
        title = encode_minimal(&article.title),
        meta = meta_html,
        href = encode_attribute(&article.url),
        url = encode_minimal(&article.url),
        body = body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Article;

    fn fonts() -> FontPair {
        FontPair {
            family: "Ubuntu".to_string(),
            regular: vec![0],
            bold: vec![0],
        }
    }

    fn opts() -> RenderOptions {
        RenderOptions {
            title: "News AI".to_string(),
            columns: 3,
        }
    }

    fn edition_with(articles: Vec<Article>) -> Edition {
        articles
            .into_iter()
            .map(|a| (format!("https://site.example/{}", a.url), a))
            .collect()
    }

    fn article(title: &str, pill: Option<&str>) -> Article {
        Article {
            title: title.to_string(),
            author: "Jane Reporter".to_string(),
            date: "2025-11-03".to_string(),
            text: "First paragraph.\n\nSecond paragraph.".to_string(),
            url: "https://site.example/story".to_string(),
            pill: pill.map(str::to_string),
        }
    }

    #[test]
    fn test_build_html_has_masthead_pills_and_columns() {
        let edition = edition_with(vec![article("Big Story", Some("One pill sentence."))]);
        let html = build_html(&edition, &fonts(), &opts());

        assert!(html.contains("News AI"));
        assert!(html.contains("<li>One pill sentence.</li>"));
        assert!(html.contains("column-count: 3"));
        assert!(html.contains("font-family: 'Ubuntu'"));
        assert!(html.contains("'Ubuntu Bold'"));
    }

    #[test]
    fn test_build_html_keeps_article_header_together() {
        let edition = edition_with(vec![article("Big Story", Some("Pill."))]);
        let html = build_html(&edition, &fonts(), &opts());

        assert!(html.contains(r#"class="article-header""#));
        assert!(html.contains("break-inside: avoid"));
    }

    #[test]
    fn test_build_html_escapes_markup_in_content() {
        let mut art = article("AT&T <buys> rival", Some("Deal & dollars."));
        art.text = "Profits > expectations.".to_string();
        let edition = edition_with(vec![art]);
        let html = build_html(&edition, &fonts(), &opts());

        assert!(html.contains("AT&amp;T &lt;buys&gt; rival"));
        assert!(html.contains("Deal &amp; dollars."));
        assert!(!html.contains("<buys>"));
    }

    #[test]
    fn test_build_html_splits_body_into_paragraphs() {
        let edition = edition_with(vec![article("Big Story", Some("Pill."))]);
        let html = build_html(&edition, &fonts(), &opts());

        assert!(html.contains("<p>First paragraph.</p>"));
        assert!(html.contains("<p>Second paragraph.</p>"));
    }

    #[test]
    fn test_build_html_skips_empty_pills() {
        let edition = edition_with(vec![article("No Pill Story", None)]);
        let html = build_html(&edition, &fonts(), &opts());

        assert!(!html.contains("<li>"));
        assert!(html.contains("No Pill Story"));
    }

    #[test]
    fn test_article_html_omits_meta_line_when_empty() {
        let mut art = article("Bare Story", Some("Pill."));
        art.author = String::new();
        art.date = String::new();
        let html = article_html(&art);

        assert!(!html.contains(r#"class="meta""#));
        assert!(html.contains(r#"class="source-url""#));
    }
}
