// src/verify/mod.rs
//! Live verification of logged validity windows.
//!
//! Each selected site is dialed once and the validity of the certificate
//! it presents is compared with the logged record. Findings are attached
//! to the record as an annotation; nothing is ever removed from the set.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use x509_parser::prelude::*;

use crate::dedupe::ValidSites;
use crate::error::ProbeError;
use crate::normalize::CertRecord;

pub mod probe;

pub use probe::{LeafProbe, TlsProbe};

/// Validity window of a certificate presented by a server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafValidity {
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub fingerprint: String,
}

impl LeafValidity {
    pub fn from_der(der: &[u8]) -> Result<Self, ProbeError> {
        let fingerprint = {
            let mut hasher = Sha256::new();
            hasher.update(der);
            hex::encode(hasher.finalize())
        };

        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| ProbeError::Certificate(e.to_string()))?;

        let validity = cert.validity();
        let not_before = DateTime::from_timestamp(validity.not_before.timestamp(), 0)
            .ok_or_else(|| ProbeError::Certificate("notBefore out of range".to_string()))?;
        let not_after = DateTime::from_timestamp(validity.not_after.timestamp(), 0)
            .ok_or_else(|| ProbeError::Certificate("notAfter out of range".to_string()))?;

        Ok(Self {
            not_before,
            not_after,
            fingerprint,
        })
    }

    /// First disagreement with the logged record, `NotAfter` checked first.
    /// Compared at whole-second precision.
    pub fn compare(&self, record: &CertRecord) -> Option<ValidityMismatch> {
        if self.not_after.timestamp() != record.not_after_time.timestamp() {
            Some(ValidityMismatch::NotAfter)
        } else if self.not_before.timestamp() != record.not_before_time.timestamp() {
            Some(ValidityMismatch::NotBefore)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityMismatch {
    NotAfter,
    NotBefore,
}

impl fmt::Display for ValidityMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidityMismatch::NotAfter => write!(f, "NotAfter mismatch"),
            ValidityMismatch::NotBefore => write!(f, "NotBefore mismatch"),
        }
    }
}

/// Host to dial for a name-set key: its first SAN
pub fn target_host(key: &str) -> &str {
    key.split(',').next().unwrap_or(key)
}

/// Dials each site in turn and annotates records that disagree
pub struct LiveVerifier {
    probe: Arc<dyn LeafProbe>,
}

impl LiveVerifier {
    pub fn new(probe: Arc<dyn LeafProbe>) -> Self {
        Self { probe }
    }

    /// Check one record against what its host presents.
    /// Returns the annotation to store, `None` when clean.
    pub async fn check(&self, key: &str, record: &CertRecord) -> Option<String> {
        let host = target_host(key);

        match self.probe.leaf_certificate(host).await {
            Ok(Some(der)) => match LeafValidity::from_der(&der) {
                Ok(leaf) => {
                    debug!(
                        site = %key,
                        fingerprint = %leaf.fingerprint,
                        not_before = %leaf.not_before,
                        not_after = %leaf.not_after,
                        "Received leaf certificate"
                    );
                    leaf.compare(record).map(|mismatch| mismatch.to_string())
                }
                Err(e) => Some(e.to_string()),
            },
            Ok(None) => {
                debug!(site = %key, "Server presented no certificate");
                None
            }
            Err(e) => Some(e.to_string()),
        }
    }

    /// Verify every site, one connection at a time
    pub async fn verify_all(&self, sites: &mut ValidSites) {
        let keys: Vec<String> = sites.keys().map(str::to_string).collect();

        for key in keys {
            debug!(site = %key, "Checking TLS");

            let actual = match sites.get(&key) {
                Some(record) => self.check(&key, record).await,
                None => continue,
            };

            sites.annotate(&key, actual);
        }
    }
}
