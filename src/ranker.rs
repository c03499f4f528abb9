//! Relevance ranking: ask the LLM which candidate headline is the most
//! newsworthy.
//!
//! The model sees every candidate title with a numeric index and is told to
//! answer with a single integer. The answer is parsed strictly; anything the
//! parser cannot turn into an in-range index falls back to index 0, the
//! candidate the heuristic scorer already liked best. Ranking failures never
//! fail the pipeline.

use crate::api::{ChatClient, ChatParams, complete_with_backoff};
use crate::utils::truncate_for_log;
use itertools::Itertools;
use tracing::{debug, instrument, warn};

/// Deterministic, and the answer is a single small integer.
const RANK_PARAMS: ChatParams = ChatParams {
    temperature: 0.0,
    max_tokens: 8,
};

/// Pick the most newsworthy title; returns an index into `titles`.
///
/// Falls back to 0 on any transport or parse failure. A list with a single
/// title has nothing to rank, so it resolves to 0 without an LLM call.
#[instrument(level = "info", skip_all, fields(count = titles.len()))]
pub async fn select(client: &ChatClient, titles: &[String]) -> usize {
    if titles.len() <= 1 {
        debug!("Nothing to rank");
        return 0;
    }

    let prompt = build_prompt(titles);
    match complete_with_backoff(client, &prompt, RANK_PARAMS).await {
        Ok(raw) => {
            let choice = parse_choice(&raw, titles.len());
            debug!(raw = %truncate_for_log(&raw, 80), choice, "Ranker answered");
            choice
        }
        Err(e) => {
            warn!(error = %e, "Ranking call failed; falling back to top heuristic candidate");
            0
        }
    }
}

/// Build the ranking prompt: one numbered line per candidate title.
pub fn build_prompt(titles: &[String]) -> String {
    let listing = titles
        .iter()
        .enumerate()
        .map(|(i, title)| format!("{i}. {title}"))
        .join("\n");

    format!(
        "You are a news editor picking the single most newsworthy headline.\n\
         \n\
         Candidate headlines:\n\
         {listing}\n\
         \n\
         Answer with exactly one integer: the index of the most newsworthy \
         headline. No explanation."
    )
}

/// Parse the model's answer into an index, falling back to 0.
///
/// The raw response is trimmed and parsed as an integer; parse failures and
/// out-of-range values both resolve to 0.
pub fn parse_choice(raw: &str, len: usize) -> usize {
    match raw.trim().parse::<usize>() {
        Ok(index) if index < len => index,
        _ => 0,
    }
}
