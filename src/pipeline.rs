//! Pipeline orchestration: from a list of site URLs to a summarized edition.
//!
//! The run is two explicit folds with an immutable accumulator handed from
//! step to step, never a shared mutable collection:
//!
//! 1. **Selection/extraction fold** over the configured sites: score the
//!    homepage, let the ranker pick a candidate, extract the article.
//! 2. **Summarization fold** over the extracted articles: attach one pill
//!    per article.
//!
//! Each site moves through `Pending → CandidatesFound → ArticleExtracted →
//! Summarized`, or exits early to `Skipped` with a reason the final report
//! keeps. Every site is attempted exactly once and the whole run is strictly
//! sequential; a failed site costs nothing but its own fetches.

use crate::api::ChatClient;
use crate::extract;
use crate::models::{Article, Edition, StageOutcome};
use crate::pills;
use crate::ranker;
use crate::scorer;
use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt};
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Why a site fell out of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The homepage could not be fetched.
    HomepageFailed(String),
    /// The homepage had no qualifying article links.
    NoCandidates,
    /// The chosen article could not be downloaded.
    ExtractionFailed(String),
    /// The article page yielded no usable text.
    NoContent,
    /// Pill generation failed after retries.
    SummaryFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::HomepageFailed(e) => write!(f, "homepage fetch failed: {e}"),
            SkipReason::NoCandidates => write!(f, "no candidate links found"),
            SkipReason::ExtractionFailed(e) => write!(f, "article fetch failed: {e}"),
            SkipReason::NoContent => write!(f, "no usable article content"),
            SkipReason::SummaryFailed(e) => write!(f, "pill generation failed: {e}"),
        }
    }
}

/// Where a site ended up in the per-site state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteState {
    Pending,
    CandidatesFound,
    ArticleExtracted,
    Summarized,
    Skipped(SkipReason),
}

/// Final record for one configured site.
#[derive(Debug, Clone)]
pub struct SiteReport {
    pub site: String,
    pub state: SiteState,
}

/// Accumulated result of a pipeline run.
///
/// Sites that were skipped are absent from `edition` but present in
/// `reports`, so the caller can still tell what happened to them.
#[derive(Debug, Default)]
pub struct PipelineRun {
    pub edition: Edition,
    pub reports: Vec<SiteReport>,
}

impl PipelineRun {
    pub fn skipped(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.state, SiteState::Skipped(_)))
            .count()
    }
}

/// Run the whole pipeline over the configured sites.
#[instrument(level = "info", skip_all, fields(sites = sites.len(), top_k = top_k))]
pub async fn run(client: &ChatClient, sites: Vec<String>, top_k: usize) -> PipelineRun {
    let selected = stream::iter(sites)
        .fold(PipelineRun::default(), |acc, site| {
            select_site(acc, site, client, top_k)
        })
        .await;
    info!(
        extracted = selected.edition.len(),
        skipped = selected.skipped(),
        "Selection and extraction complete"
    );

    let run = attach_pills(client, selected).await;
    info!(
        summarized = run.edition.len(),
        skipped = run.skipped(),
        "Summarization complete"
    );
    run
}

/// Selection/extraction step for one site.
async fn select_site(
    mut acc: PipelineRun,
    site: String,
    client: &ChatClient,
    top_k: usize,
) -> PipelineRun {
    info!(%site, "Processing site");
    acc.reports.push(SiteReport {
        site: site.clone(),
        state: SiteState::Pending,
    });

    let candidates = match scorer::fetch_top_candidates(&site, top_k).await {
        StageOutcome::Found(candidates) => candidates,
        StageOutcome::Empty => {
            return skip(acc, site, SkipReason::NoCandidates);
        }
        StageOutcome::Failed(e) => {
            return skip(acc, site, SkipReason::HomepageFailed(e));
        }
    };
    set_state(&mut acc.reports, &site, SiteState::CandidatesFound);
    debug!(%site, count = candidates.len(), "Candidates found");

    let titles: Vec<String> = candidates.iter().map(|c| c.title.clone()).collect();
    let choice = ranker::select(client, &titles).await;
    let chosen = &candidates[choice];
    info!(%site, url = %chosen.url, score = chosen.score, "Top article chosen");

    match extract::fetch_article(&chosen.url).await {
        StageOutcome::Found(article) => {
            debug!(
                %site,
                title = %article.title,
                author = %article.author,
                date = %article.date,
                url = %article.url,
                preview = %truncate_for_log(&article.text, 400),
                "Extracted article fields"
            );
            acc.edition.insert(site.clone(), article);
            set_state(&mut acc.reports, &site, SiteState::ArticleExtracted);
            acc
        }
        StageOutcome::Empty => skip(acc, site, SkipReason::NoContent),
        StageOutcome::Failed(e) => skip(acc, site, SkipReason::ExtractionFailed(e)),
    }
}

/// Summarization fold: attach one pill per extracted article.
///
/// A failed pill drops the site from the edition rather than aborting the
/// run; the skip reason lands in the report like any other stage failure.
async fn attach_pills(client: &ChatClient, selected: PipelineRun) -> PipelineRun {
    let PipelineRun { edition, reports } = selected;
    let acc = PipelineRun {
        edition: Edition::new(),
        reports,
    };

    stream::iter(edition)
        .fold(acc, |acc, (site, article)| {
            summarize_site(acc, site, article, client)
        })
        .await
}

async fn summarize_site(
    mut acc: PipelineRun,
    site: String,
    article: Article,
    client: &ChatClient,
) -> PipelineRun {
    info!(%site, title = %article.title, "Generating news pill");
    match pills::generate_pill(client, &article.title, &article.text).await {
        Ok(pill) => {
            set_state(&mut acc.reports, &site, SiteState::Summarized);
            acc.edition.insert(site, article.with_pill(pill));
        }
        Err(e) => {
            warn!(%site, error = %e, "Pill generation failed; dropping site from edition");
            set_state(
                &mut acc.reports,
                &site,
                SiteState::Skipped(SkipReason::SummaryFailed(e.to_string())),
            );
        }
    }
    acc
}

fn skip(mut acc: PipelineRun, site: String, reason: SkipReason) -> PipelineRun {
    warn!(%site, %reason, "Skipping site");
    set_state(&mut acc.reports, &site, SiteState::Skipped(reason));
    acc
}

// A site listed twice has two reports; the state change belongs to the
// most recent attempt.
fn set_state(reports: &mut [SiteReport], site: &str, state: SiteState) {
    if let Some(report) = reports.iter_mut().rev().find(|r| r.site == site) {
        report.state = state;
    }
}
