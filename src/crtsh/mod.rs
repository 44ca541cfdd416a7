// src/crtsh/mod.rs
//! crt.sh transparency log search.

use async_trait::async_trait;

use crate::error::FetchError;

pub mod client;
pub mod types;

pub use client::CrtShClient;
pub use types::CrtShEntry;

/// Source of transparency log rows for a query string
#[async_trait]
pub trait CertLogSource: Send + Sync {
    /// Return every row matching `query`, in the order the log returns them
    async fn fetch(&self, query: &str) -> Result<Vec<CrtShEntry>, FetchError>;
}

/// The `%.domain` pattern matching every subdomain of `domain`
pub fn wildcard_query(domain: &str) -> String {
    format!("%.{}", domain)
}
