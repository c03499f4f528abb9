//! Command-line interface definitions for Pill Press.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Provider-related options can also be supplied via environment variables.

use clap::Parser;

/// Command-line arguments for the Pill Press application.
///
/// # Examples
///
/// ```sh
/// # Basic usage with the defaults (sites.json, fonts/, news_ai.pdf)
/// pill_press
///
/// # Custom sites file and output path
/// pill_press -s my_sites.json -o out/tuesday.pdf
///
/// # Different LLM endpoint and model
/// pill_press --base-url https://api.groq.com/openai/v1/chat/completions \
///            --model llama-3.3-70b-versatile
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the JSON file listing site homepage URLs
    #[arg(short, long, default_value = "sites.json")]
    pub sites: String,

    /// Output path for the generated PDF
    #[arg(short, long, default_value = "news_ai.pdf")]
    pub output: String,

    /// Path to a plain-text file containing the LLM provider API key
    #[arg(long, env = "LLM_API_KEY_FILE", default_value = "api_key.txt")]
    pub api_key_file: String,

    /// Chat-completions endpoint of an OpenAI-compatible provider
    #[arg(
        long,
        env = "LLM_BASE_URL",
        default_value = "https://api.groq.com/openai/v1/chat/completions"
    )]
    pub base_url: String,

    /// Model identifier sent with every LLM request
    #[arg(long, env = "LLM_MODEL", default_value = "llama-3.3-70b-versatile")]
    pub model: String,

    /// How many top-scored candidates per site are offered to the ranker
    #[arg(long, default_value_t = 5)]
    pub top_k: usize,

    /// Font family name; requires fonts/<Family>-Regular.ttf and -Bold.ttf
    #[arg(long, default_value = "Ubuntu")]
    pub font_family: String,

    /// Directory containing the font files
    #[arg(long, default_value = "fonts")]
    pub fonts_dir: String,

    /// Number of text columns on each page
    #[arg(long, default_value_t = 3)]
    pub columns: u32,

    /// Masthead title printed at the top of the front page
    #[arg(long, default_value = "News AI")]
    pub title: String,
}
