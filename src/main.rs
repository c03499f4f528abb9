//! # Pill Press
//!
//! A news aggregation pipeline that scrapes configured homepages, picks each
//! site's top story, summarizes it into a one-sentence "pill" through an
//! LLM, and typesets everything into a newspaper-style PDF.
//!
//! ## Features
//!
//! - Scores homepage links with a fixed-weight heuristic and keeps the top-k
//!   candidates per site
//! - Asks an OpenAI-compatible LLM which candidate headline is most
//!   newsworthy, falling back to the heuristic winner on any failure
//! - Extracts article text and metadata with readability-style parsing
//! - Generates one pill per article and renders a multi-column PDF with a
//!   pills digest up front
//!
//! ## Usage
//!
//! ```sh
//! pill_press -s sites.json -o news_ai.pdf
//! ```
//!
//! ## Architecture
//!
//! The application is a strictly sequential pipeline:
//! 1. **Scoring**: Rank candidate links on each configured homepage
//! 2. **Ranking**: One LLM call per site picks the top candidate
//! 3. **Extraction**: Download and clean the chosen article
//! 4. **Summarization**: One LLM call per article attaches its pill
//! 5. **Output**: Lay out the edition and write the PDF

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod extract;
mod models;
mod outputs;
mod pills;
mod pipeline;
mod ranker;
mod scorer;
mod utils;

use api::ChatClient;
use cli::Cli;
use outputs::fonts::FontPair;
use outputs::pdf::{self, RenderOptions};
use pipeline::SiteState;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("pill_press starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.sites, ?args.output, ?args.model, "Parsed CLI arguments");

    // --- Fatal startup checks; nothing is fetched until all of them pass ---
    let api_key = match config::load_api_key(&args.api_key_file).await {
        Ok(key) => key,
        Err(e) => {
            error!(path = %args.api_key_file, error = %e, "Cannot start without an API key");
            return Err(e);
        }
    };

    let fonts = match FontPair::resolve(&args.fonts_dir, &args.font_family) {
        Ok(fonts) => fonts,
        Err(e) => {
            error!(
                family = %args.font_family,
                fonts_dir = %args.fonts_dir,
                error = %e,
                "Font assets are missing (place <Family>-Regular.ttf and <Family>-Bold.ttf in the fonts directory)"
            );
            return Err(e);
        }
    };

    if let Some(parent) = Path::new(&args.output).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = ensure_writable_dir(&parent.to_string_lossy()).await {
                error!(
                    path = %parent.display(),
                    error = %e,
                    "Output directory is not writable (fix perms or choose a different path)"
                );
                return Err(e);
            }
        }
    }

    let sites = config::load_sites(&args.sites).await?;
    info!(count = sites.len(), "Found sites to be processed");
    if sites.is_empty() {
        warn!("Sites list is empty; the edition will have no articles");
    }

    // ---- Run the pipeline ----
    let client = ChatClient::new(args.base_url.clone(), api_key, args.model.clone());
    let run = pipeline::run(&client, sites, args.top_k).await;

    for report in &run.reports {
        match &report.state {
            SiteState::Summarized => debug!(site = %report.site, "Site completed"),
            SiteState::Skipped(reason) => info!(site = %report.site, %reason, "Site skipped"),
            other => debug!(site = %report.site, state = ?other, "Site ended mid-stage"),
        }
    }
    info!(
        articles = run.edition.len(),
        skipped = run.skipped(),
        "Pipeline complete"
    );

    // ---- Render and write the PDF ----
    let render_opts = RenderOptions {
        title: args.title.clone(),
        columns: args.columns,
    };
    let bytes = pdf::render_pdf(&run.edition, &fonts, &render_opts)?;

    if let Err(e) = tokio::fs::write(&args.output, &bytes).await {
        error!(path = %args.output, error = %e, "Failed writing PDF");
        return Err(e.into());
    }
    info!(path = %args.output, bytes = bytes.len(), "PDF generated");

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
