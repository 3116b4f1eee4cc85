use crate::model::{Project, ResourceModule, DEFAULT_BASE_NAME};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://rest.api.transifex.com/";

/// Explicit proxy settings, threaded into the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub url: String,
    pub credentials: Option<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct Config {
    // Transifex
    pub base_url: String,
    pub organization: String,
    pub project: String,
    pub token: String,
    pub source_language: String,

    // Resources
    pub modules: Vec<String>,
    pub base_names: Vec<String>,

    // Output
    pub output_dir: PathBuf,
    pub languages_file: Option<PathBuf>,

    // Export polling
    pub poll_attempts: u32,
    pub poll_interval: Duration,
    pub concurrency: usize,

    // Network
    pub proxy: Option<ProxyConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("TRANSIFEX_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let modules = split_list(
            &std::env::var("TRANSIFEX_MODULES").context("TRANSIFEX_MODULES not set")?,
        );
        if modules.is_empty() {
            bail!("TRANSIFEX_MODULES must name at least one resource");
        }

        let poll_attempts = std::env::var("TRANSIFEX_POLL_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);
        if poll_attempts == 0 {
            bail!("TRANSIFEX_POLL_ATTEMPTS must be at least 1");
        }

        Ok(Self {
            base_url: with_trailing_slash(base_url),
            organization: std::env::var("TRANSIFEX_ORGANIZATION")
                .context("TRANSIFEX_ORGANIZATION not set")?,
            project: std::env::var("TRANSIFEX_PROJECT").context("TRANSIFEX_PROJECT not set")?,
            token: std::env::var("TRANSIFEX_TOKEN").context("TRANSIFEX_TOKEN not set")?,
            source_language: std::env::var("TRANSIFEX_SOURCE_LANGUAGE")
                .unwrap_or_else(|_| "en".to_string()),

            modules,
            base_names: std::env::var("TRANSIFEX_BASE_NAMES")
                .map(|v| split_list(&v))
                .unwrap_or_default(),

            output_dir: std::env::var("TRANSIFEX_OUTPUT_DIR")
                .context("TRANSIFEX_OUTPUT_DIR not set")?
                .into(),
            languages_file: std::env::var("TRANSIFEX_LANGUAGES_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),

            poll_attempts,
            poll_interval: Duration::from_millis(
                std::env::var("TRANSIFEX_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(500),
            ),
            concurrency: std::env::var("TRANSIFEX_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(1),

            proxy: proxy_from_env()?,
        })
    }

    pub fn project(&self) -> Project {
        Project::new(&self.organization, &self.project)
    }

    /// Resources paired with their output base names by position.
    pub fn resources(&self) -> Vec<ResourceModule> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, slug)| {
                let base_name = self
                    .base_names
                    .get(i)
                    .map(String::as_str)
                    .unwrap_or(DEFAULT_BASE_NAME);
                ResourceModule::new(slug, base_name)
            })
            .collect()
    }
}

fn proxy_from_env() -> Result<Option<ProxyConfig>> {
    let Ok(url) = std::env::var("TRANSIFEX_PROXY_URL") else {
        return Ok(None);
    };

    let user = std::env::var("TRANSIFEX_PROXY_USER").ok();
    let password = std::env::var("TRANSIFEX_PROXY_PASSWORD").ok();
    let credentials = match (user, password) {
        (Some(user), Some(password)) => Some((user, password)),
        (Some(_), None) => {
            bail!("TRANSIFEX_PROXY_USER is set but TRANSIFEX_PROXY_PASSWORD is not")
        }
        (None, Some(_)) => {
            bail!("TRANSIFEX_PROXY_PASSWORD is set but TRANSIFEX_PROXY_USER is not")
        }
        (None, None) => None,
    };

    Ok(Some(ProxyConfig { url, credentials }))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn with_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}
