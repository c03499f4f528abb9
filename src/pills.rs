//! Pill generation: one-sentence "highlight box" summaries.
//!
//! The article body is cut down to a fixed character budget before it is sent
//! to the model, preferring to cut at a sentence boundary so the model never
//! sees a half sentence. The model's trimmed response is taken verbatim; the
//! instruction to produce a single short sentence is trusted, not enforced.

use crate::api::{ChatClient, ChatParams, complete_with_backoff};
use std::error::Error;
use tracing::{info, instrument};

/// Character budget for article text sent to the model.
const MAX_TEXT_CHARS: usize = 2000;

/// A sentence cut this close to the start would be uselessly short; fall back
/// to a hard cut instead.
const MIN_SENTENCE_OFFSET: usize = 100;

const PILL_PARAMS: ChatParams = ChatParams {
    temperature: 0.3,
    max_tokens: 120,
};

/// Generate a one-sentence pill for an article.
///
/// Errors propagate to the caller after the shared retry policy is exhausted;
/// the orchestrator decides what a failed pill means for the site.
#[instrument(level = "info", skip_all, fields(title = %title))]
pub async fn generate_pill(
    client: &ChatClient,
    title: &str,
    text: &str,
) -> Result<String, Box<dyn Error>> {
    let prompt = build_prompt(title, &truncate_text(text, MAX_TEXT_CHARS));
    let pill = complete_with_backoff(client, &prompt, PILL_PARAMS)
        .await?
        .trim()
        .to_string();
    info!(pill = %pill, "Generated pill");
    Ok(pill)
}

/// Build the highlight-box prompt.
pub fn build_prompt(title: &str, text: &str) -> String {
    format!(
        "You are a news summarization assistant.\n\
         \n\
         Given the following article title and text, produce ONE single \
         sentence, very short (max 25 words), written like a newspaper \
         highlight box.\n\
         \n\
         TITLE: {title}\n\
         \n\
         TEXT:\n\
         {text}\n\
         \n\
         Return only the sentence, nothing else."
    )
}

/// Truncate text to `max_chars`, avoiding a cut in the middle of a sentence.
///
/// If the truncated text contains a period past [`MIN_SENTENCE_OFFSET`], the
/// cut lands just after that period; otherwise the text is cut hard at the
/// limit and an ellipsis marker is appended.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_chars).collect();

    if let Some(cut) = truncated.rfind('.') {
        if truncated[..cut].chars().count() > MIN_SENTENCE_OFFSET {
            return truncated[..=cut].to_string();
        }
    }

    format!("{truncated}...")
}
