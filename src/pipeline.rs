// src/pipeline.rs
//! One run: fetch, normalize, dedupe, verify.

use chrono::{DateTime, Utc};
use futures_util::future;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::crtsh::{wildcard_query, CertLogSource, CrtShEntry};
use crate::dedupe::{Dedupe, FilterPolicy, ValidSites};
use crate::normalize::{keep_parsed, normalize_all};
use crate::verify::LiveVerifier;

pub struct Pipeline {
    source: Arc<dyn CertLogSource>,
    filter: FilterPolicy,
    verifier: Option<LiveVerifier>,
}

impl Pipeline {
    pub fn new(source: Arc<dyn CertLogSource>, filter: FilterPolicy) -> Self {
        Self {
            source,
            filter,
            verifier: None,
        }
    }

    /// Dial every selected site and compare its live certificate
    pub fn with_verifier(mut self, verifier: LiveVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn verifies(&self) -> bool {
        self.verifier.is_some()
    }

    /// Rows for the domain followed by rows for its wildcard.
    ///
    /// Both queries run concurrently. A failed query is logged and
    /// contributes nothing.
    pub async fn collect(&self, domain: &str) -> Vec<CrtShEntry> {
        let wildcard = wildcard_query(domain);

        let (direct, wild) = future::join(
            self.source.fetch(domain),
            self.source.fetch(&wildcard),
        )
        .await;

        let mut entries = Vec::new();
        for (query, result) in [(domain, direct), (wildcard.as_str(), wild)] {
            match result {
                Ok(rows) => {
                    debug!("{} entries for {:?}", rows.len(), query);
                    entries.extend(rows);
                }
                Err(e) => error!(query = %query, "Failed to fetch log entries: {}", e),
            }
        }

        entries
    }

    /// Run the pipeline with `now` as the reference time
    pub async fn run_at(&self, domain: &str, now: DateTime<Utc>) -> ValidSites {
        debug!(domain = %domain, "Getting certs");

        let entries = self.collect(domain).await;
        let fetched = entries.len();

        let records = keep_parsed(normalize_all(entries, now));
        let parsed = records.len();

        let mut sites = Dedupe::new(self.filter, now).run(records);

        info!(
            "{} log entries, {} parsed, {} unique name sets",
            fetched,
            parsed,
            sites.len()
        );

        if let Some(verifier) = &self.verifier {
            verifier.verify_all(&mut sites).await;
        }

        sites
    }

    pub async fn run(&self, domain: &str) -> ValidSites {
        self.run_at(domain, Utc::now()).await
    }
}
