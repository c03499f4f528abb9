//! Startup configuration: the sites list and the LLM credential file.
//!
//! Both files are read exactly once, before any site processing begins, and
//! any problem with them is a fatal startup error. There is nothing to do
//! with a pipeline that has no sites or cannot authenticate.
//!
//! # Sites file
//!
//! A JSON document with a single `sites` key:
//!
//! ```json
//! { "sites": ["https://example-news.com", "https://other-news.org"] }
//! ```

use serde::Deserialize;
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

/// The parsed sites configuration file.
#[derive(Debug, Deserialize)]
pub struct SitesConfig {
    /// Homepage URLs to process, in order.
    pub sites: Vec<String>,
}

/// Load the list of site homepage URLs from a JSON config file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn load_sites(path: &str) -> Result<Vec<String>, Box<dyn Error>> {
    let raw = fs::read_to_string(path)
        .await
        .map_err(|e| format!("cannot read sites file {path}: {e}"))?;
    let config: SitesConfig =
        serde_json::from_str(&raw).map_err(|e| format!("invalid sites file {path}: {e}"))?;
    info!(count = config.sites.len(), "Loaded sites configuration");
    Ok(config.sites)
}

/// Read the LLM provider API key from a plain-text file.
///
/// The file content is trimmed; a missing or empty file is an error.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn load_api_key(path: &str) -> Result<String, Box<dyn Error>> {
    let raw = fs::read_to_string(path)
        .await
        .map_err(|e| format!("cannot read API key file {path}: {e}"))?;
    let key = raw.trim().to_string();
    if key.is_empty() {
        return Err(format!("API key file {path} is empty").into());
    }
    info!("Loaded API key");
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sites_config_parses() {
        let json = r#"{ "sites": ["https://a.com", "https://b.com"] }"#;
        let config: SitesConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.sites, vec!["https://a.com", "https://b.com"]);
    }

    #[test]
    fn test_sites_config_allows_empty_list() {
        let config: SitesConfig = serde_json::from_str(r#"{ "sites": [] }"#).unwrap();
        assert!(config.sites.is_empty());
    }

    #[test]
    fn test_sites_config_rejects_missing_key() {
        let result: Result<SitesConfig, _> = serde_json::from_str(r#"{ "urls": [] }"#);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_api_key_trims_whitespace() {
        let dir = std::env::temp_dir().join("pill_press_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("key.txt");
        std::fs::write(&path, "  gsk_abc123\n").unwrap();

        let key = load_api_key(path.to_str().unwrap()).await.unwrap();
        assert_eq!(key, "gsk_abc123");
    }

    #[tokio::test]
    async fn test_load_api_key_rejects_empty_file() {
        let dir = std::env::temp_dir().join("pill_press_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("empty_key.txt");
        std::fs::write(&path, "\n").unwrap();

        assert!(load_api_key(path.to_str().unwrap()).await.is_err());
    }

    #[tokio::test]
    async fn test_load_api_key_missing_file_is_error() {
        let result = load_api_key("/nonexistent/pill_press/key.txt").await;
        assert!(result.is_err());
    }
}
