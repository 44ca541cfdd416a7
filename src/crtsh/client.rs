// src/crtsh/client.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

use super::types::CrtShEntry;
use super::CertLogSource;
use crate::config::CrtShConfig;
use crate::error::FetchError;

/// HTTP client for crt.sh's JSON search endpoint
pub struct CrtShClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl CrtShClient {
    /// Create a new crt.sh client
    pub fn new(config: &CrtShConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Build the search URL for a query
    /// Endpoint: GET {base_url}/json?q={query}
    pub fn search_url(&self, query: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&format!("{}/json", self.base_url))?;
        url.query_pairs_mut().append_pair("q", query);
        Ok(url)
    }

    /// Search the log for a domain or wildcard pattern
    pub async fn search(&self, query: &str) -> Result<Vec<CrtShEntry>, FetchError> {
        let started = Instant::now();
        let url = self.search_url(query)?;

        debug!("Querying {}", url);

        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let body = response.bytes().await?;

        // crt.sh sends an empty body instead of [] for some unknown names
        let entries: Vec<CrtShEntry> = if body.iter().all(u8::is_ascii_whitespace) {
            Vec::new()
        } else {
            serde_json::from_slice(&body)?
        };

        debug!(
            "Received {} entries for {:?} in {:?}",
            entries.len(),
            query,
            started.elapsed()
        );

        Ok(entries)
    }
}

#[async_trait]
impl CertLogSource for CrtShClient {
    async fn fetch(&self, query: &str) -> Result<Vec<CrtShEntry>, FetchError> {
        self.search(query).await
    }
}
