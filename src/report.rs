// src/report.rs
//! Report lines built from the selected certificate set.

use chrono::TimeDelta;
use serde::Serialize;
use std::fmt;

use crate::dedupe::ValidSites;
use crate::normalize::CertRecord;

/// Severity of a report line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    /// Expired wins over a verification finding
    pub fn for_record(record: &CertRecord) -> Self {
        if record.expired {
            Severity::Warn
        } else if record.actual.as_deref().is_some_and(|actual| !actual.is_empty()) {
            Severity::Error
        } else {
            Severity::Info
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warn => write!(f, "warn"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One site in the final report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLine {
    /// Name-set key
    pub site: String,
    pub severity: Severity,

    /// Logged timestamps, as crt.sh returned them
    pub not_after: String,
    pub not_before: String,

    pub time_left: String,
    pub time_left_secs: i64,
    pub expired: bool,

    /// Live verification finding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,

    pub issuer_ca_id: i64,
    pub issuer_name: String,
    pub min_cert_id: i64,
    pub min_entry_timestamp: String,
}

impl ReportLine {
    pub fn from_record(site: &str, record: &CertRecord) -> Self {
        Self {
            site: site.to_string(),
            severity: Severity::for_record(record),
            not_after: record.entry.not_after.clone(),
            not_before: record.entry.not_before.clone(),
            time_left: format_time_left(record.time_left),
            time_left_secs: record.time_left.num_seconds(),
            expired: record.expired,
            actual: record.actual.clone().filter(|actual| !actual.is_empty()),
            issuer_ca_id: record.entry.issuer_ca_id,
            issuer_name: record.entry.issuer_name.clone(),
            min_cert_id: record.entry.min_cert_id,
            min_entry_timestamp: record.entry.min_entry_timestamp.clone(),
        }
    }
}

/// Report lines sorted by site key
pub fn build_report(sites: &ValidSites) -> Vec<ReportLine> {
    sites
        .sorted_keys()
        .into_iter()
        .filter_map(|key| sites.get(key).map(|record| ReportLine::from_record(key, record)))
        .collect()
}

/// Format a signed duration as `41d 3h 12m`
pub fn format_time_left(delta: TimeDelta) -> String {
    let total = delta.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let secs = total.unsigned_abs();

    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;

    format!("{}{}d {}h {}m", sign, days, hours, minutes)
}
