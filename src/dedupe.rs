// src/dedupe.rs
//! Collapse log records to the newest certificate per name set.
//!
//! crt.sh returns every precertificate and certificate ever logged for a
//! name, so the same SAN list shows up many times. Records are keyed by
//! their SAN list and only the one with the latest `not_after` survives.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;

use crate::normalize::CertRecord;

/// Rule deciding which records are discarded before selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPolicy {
    /// Drop records whose `not_after` is more than `days` in the past
    GraceWindow { days: u32 },
    /// Drop every record flagged expired, including not-yet-valid ones
    DropExpired,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        FilterPolicy::GraceWindow { days: 30 }
    }
}

impl FilterPolicy {
    pub fn retains(&self, record: &CertRecord, now: DateTime<Utc>) -> bool {
        match *self {
            FilterPolicy::GraceWindow { days } => {
                // A window reaching past the earliest representable time keeps everything
                match now.checked_sub_signed(TimeDelta::days(i64::from(days))) {
                    Some(cutoff) => record.not_after_time >= cutoff,
                    None => true,
                }
            }
            FilterPolicy::DropExpired => !record.expired,
        }
    }
}

/// Dedup key for a crt.sh `name_value`: the SAN list joined with commas.
///
/// The list is not sorted, so the same names in a different order give a
/// different key.
pub fn name_key(name_value: &str) -> String {
    name_value.replace('\n', ",")
}

/// Selected record per name-set key
///
/// Records live in a table indexed by key; updates go through
/// [`ValidSites::annotate`].
#[derive(Debug, Clone, Default)]
pub struct ValidSites {
    slots: Vec<(String, CertRecord)>,
    index: HashMap<String, usize>,
}

impl ValidSites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a record for `key`. Returns true if it was stored.
    ///
    /// A held record is replaced only by a strictly later `not_after`, so
    /// ties keep the first one seen.
    pub fn offer(&mut self, key: String, record: CertRecord) -> bool {
        match self.index.get(&key) {
            Some(&slot) => {
                let held = &mut self.slots[slot].1;
                if held.not_after_time < record.not_after_time {
                    *held = record;
                    true
                } else {
                    false
                }
            }
            None => {
                self.index.insert(key.clone(), self.slots.len());
                self.slots.push((key, record));
                true
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&CertRecord> {
        self.index.get(key).map(|&slot| &self.slots[slot].1)
    }

    /// Record the live verification finding for `key`.
    /// Returns false if the key is unknown.
    pub fn annotate(&mut self, key: &str, actual: Option<String>) -> bool {
        match self.index.get(key) {
            Some(&slot) => {
                self.slots[slot].1.actual = actual;
                true
            }
            None => false,
        }
    }

    /// Keys in first-seen order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(key, _)| key.as_str())
    }

    /// Keys in plain lexicographic order
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn into_records(self) -> Vec<CertRecord> {
        self.slots.into_iter().map(|(_, record)| record).collect()
    }
}

/// Filters records and keeps the newest per name set
#[derive(Debug, Clone)]
pub struct Dedupe {
    policy: FilterPolicy,
    now: DateTime<Utc>,
}

impl Dedupe {
    pub fn new(policy: FilterPolicy, now: DateTime<Utc>) -> Self {
        Self { policy, now }
    }

    pub fn run<I>(&self, records: I) -> ValidSites
    where
        I: IntoIterator<Item = CertRecord>,
    {
        let mut sites = ValidSites::new();

        for record in records {
            if !self.policy.retains(&record, self.now) {
                continue;
            }
            let key = name_key(&record.entry.name_value);
            sites.offer(key, record);
        }

        sites
    }
}
