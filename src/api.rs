//! LLM API interaction with exponential backoff retry logic.
//!
//! This module provides the single outbound interface to an OpenAI-compatible
//! chat-completions endpoint. Every LLM call site in the pipeline (relevance
//! ranking and pill generation) goes through [`complete_with_backoff`], so
//! transient provider failures are handled with one uniform policy instead of
//! per-call-site improvisation.
//!
//! # Architecture
//!
//! - [`ChatClient`]: owns the HTTP client, endpoint, credential, and model id
//! - [`Complete`]: core trait for sending one prompt and getting text back
//! - [`Retry`]: decorator that adds retry logic to any `Complete` implementation
//!
//! # Retry Strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use crate::utils::truncate_for_log;
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Per-request sampling parameters.
///
/// Each call site picks its own temperature and output budget; the model and
/// endpoint are fixed on the [`ChatClient`].
#[derive(Debug, Clone, Copy)]
pub struct ChatParams {
    /// Sampling temperature; low values for deterministic answers.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
///
/// One instance is built at startup and shared by reference across the whole
/// run; `reqwest::Client` pools connections internally.
pub struct ChatClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl ChatClient {
    pub fn new(base_url: String, api_key: String, model: String) -> ChatClient {
        ChatClient {
            base_url,
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }

    /// Send a single role-tagged prompt and return the completion text.
    ///
    /// One outbound network call; no retries at this layer.
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn complete(&self, prompt: &str, params: &ChatParams) -> Result<String, Box<dyn Error>> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!(
                "chat API returned {status}: {}",
                truncate_for_log(&body, 300)
            )
            .into());
        }

        let parsed: ChatResponse = response.json().await?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or("chat API response has no choices")?;
        Ok(choice.message.content)
    }
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // api_key deliberately omitted
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Trait for sending one prompt to the LLM.
///
/// Implementors can send text to an LLM and receive a response. This
/// abstraction exists so decorators like [`Retry`] compose over the plain
/// client, and so the retry loop can be tested without a network.
pub trait Complete {
    /// Send the prompt and return the completion text.
    async fn complete(&self, prompt: &str) -> Result<String, Box<dyn Error>>;
}

/// [`ChatClient`] bound to a fixed set of [`ChatParams`].
#[derive(Debug)]
struct BoundClient<'a> {
    client: &'a ChatClient,
    params: ChatParams,
}

impl Complete for BoundClient<'_> {
    #[instrument(level = "info", skip_all)]
    async fn complete(&self, prompt: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = self.client.complete(prompt, &self.params).await;
        let dt = t0.elapsed();

        match &res {
            Ok(_) => {}
            Err(e) => warn!(elapsed_ms = dt.as_millis() as u128, error = %e, "API call failed"),
        }
        res
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`Complete`]
/// implementation.
///
/// # Backoff Strategy
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct Retry<T> {
    /// The underlying LLM client to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> Retry<T>
where
    T: Complete,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Retry<T> {
        Retry {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for Retry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retry")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> Complete for Retry<T>
where
    T: Complete + fmt::Debug,
{
    #[instrument(level = "info", skip_all)]
    async fn complete(&self, prompt: &str) -> Result<String, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.complete(prompt).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "complete() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "complete() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Send a prompt with the uniform retry policy.
///
/// This is the only entry point the pipeline stages use; both the ranker and
/// the pill generator get identical backoff behavior through it.
///
/// # Retry Behavior
///
/// - Up to 5 retry attempts
/// - Exponential backoff: 1s, 2s, 4s, 8s, 16s (capped at 30s)
/// - Random jitter added to prevent thundering herd
#[instrument(level = "info", skip_all)]
pub async fn complete_with_backoff(
    client: &ChatClient,
    prompt: &str,
    params: ChatParams,
) -> Result<String, Box<dyn Error>> {
    let t0 = Instant::now();
    let bound = BoundClient { client, params };
    let api = Retry::new(bound, 5, StdDuration::from_secs(1));
    let res = api.complete(prompt).await;
    let dt = t0.elapsed();

    match &res {
        Ok(_) => info!(
            elapsed_ms_total = dt.as_millis() as u128,
            "complete_with_backoff succeeded"
        ),
        Err(e) => {
            error!(elapsed_ms_total = dt.as_millis() as u128, error = %e, "complete_with_backoff failed")
        }
    }
    res
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_chat_request_serialization() {
        let req = ChatRequest {
            model: "test-model".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "Hello".to_string(),
            }],
            temperature: 0.3,
            max_tokens: 64,
        };

        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""model":"test-model""#));
        assert!(json.contains(r#""role":"user""#));
        assert!(json.contains(r#""max_tokens":64"#));
    }

    #[test]
    fn test_chat_response_deserialization() {
        let json = r#"{
            "id": "chatcmpl-1",
            "model": "test-model",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "2" } }
            ]
        }"#;

        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.choices[0].message.content, "2");
    }

    #[test]
    fn test_chat_client_debug_hides_api_key() {
        let client = ChatClient::new(
            "http://localhost/v1/chat/completions".to_string(),
            "secret-key".to_string(),
            "test-model".to_string(),
        );
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("test-model"));
    }

    #[derive(Debug)]
    struct AlwaysFails {
        calls: RefCell<usize>,
    }

    impl Complete for AlwaysFails {
        async fn complete(&self, _prompt: &str) -> Result<String, Box<dyn Error>> {
            *self.calls.borrow_mut() += 1;
            Err("boom".into())
        }
    }

    #[derive(Debug)]
    struct SucceedsOnThird {
        calls: RefCell<usize>,
    }

    impl Complete for SucceedsOnThird {
        async fn complete(&self, _prompt: &str) -> Result<String, Box<dyn Error>> {
            *self.calls.borrow_mut() += 1;
            if *self.calls.borrow() < 3 {
                Err("not yet".into())
            } else {
                Ok("ok".to_string())
            }
        }
    }

    #[tokio::test]
    async fn test_retry_exhausts_and_returns_error() {
        let stub = AlwaysFails {
            calls: RefCell::new(0),
        };
        let retry = Retry::new(stub, 2, StdDuration::from_millis(1));
        let result = retry.complete("prompt").await;
        assert!(result.is_err());
        // initial attempt + 2 retries
        assert_eq!(*retry.inner.calls.borrow(), 3);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let stub = SucceedsOnThird {
            calls: RefCell::new(0),
        };
        let retry = Retry::new(stub, 5, StdDuration::from_millis(1));
        let result = retry.complete("prompt").await.unwrap();
        assert_eq!(result, "ok");
        assert_eq!(*retry.inner.calls.borrow(), 3);
    }
}
