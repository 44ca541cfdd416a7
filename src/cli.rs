// src/cli.rs
use clap::Parser;

use crate::config::{Config, FilterPolicyKind};

/// crt-expiry: Certificate Transparency expiry report
///
/// Looks up a domain and its subdomains on crt.sh, keeps the newest
/// certificate per SAN list and checks each site's live certificate.
#[derive(Parser, Debug, Clone)]
#[command(name = "crt-expiry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Domain to look up (subdomains are included through %.<domain>)
    pub domain: String,

    // ===== Configuration =====
    /// Path to an optional TOML config file
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    // ===== Filtering =====
    /// Hide every expired or not-yet-valid certificate (no grace window)
    #[arg(long = "drop-expired")]
    pub drop_expired: bool,

    /// Keep certificates that expired up to this many days ago
    #[arg(long = "grace-days")]
    pub grace_days: Option<u32>,

    // ===== Live Verification =====
    /// Skip the TLS check against each site
    #[arg(long = "no-verify")]
    pub no_verify: bool,

    /// TLS dial timeout in seconds
    #[arg(long = "probe-timeout")]
    pub probe_timeout: Option<u64>,

    // ===== Output =====
    /// Output the report in JSONL format instead of log lines
    #[arg(short = 'j', long = "json")]
    pub json: bool,

    /// Write JSON output to file instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<String>,

    // ===== Logging =====
    /// Verbose logging (set log level to debug)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet logging (set log level to warn)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    /// Validate flag combinations and return errors for invalid usage
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.domain.trim().is_empty() {
            anyhow::bail!("Domain must not be empty");
        }

        if self.drop_expired && self.grace_days.is_some() {
            anyhow::bail!(
                "Cannot combine --drop-expired with --grace-days: \
                --drop-expired has no grace window"
            );
        }

        if self.probe_timeout == Some(0) {
            anyhow::bail!("--probe-timeout must be greater than 0");
        }

        if self.output.is_some() && !self.json {
            anyhow::bail!("--output requires --json");
        }

        // Verbose and quiet are mutually exclusive
        if self.verbose && self.quiet {
            anyhow::bail!("Cannot specify both --verbose and --quiet");
        }

        Ok(())
    }

    /// Apply command-line overrides on top of the loaded config
    pub fn apply(&self, config: &mut Config) {
        if self.drop_expired {
            config.filter.policy = FilterPolicyKind::DropExpired;
        }

        if let Some(days) = self.grace_days {
            config.filter.policy = FilterPolicyKind::GraceWindow;
            config.filter.grace_days = days;
        }

        if self.no_verify {
            config.verify.enabled = false;
        }

        if let Some(timeout) = self.probe_timeout {
            config.verify.timeout_secs = timeout;
        }
    }

    /// Determine log level from verbose/quiet flags, else the configured one
    pub fn log_level<'a>(&self, configured: &'a str) -> &'a str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            configured
        }
    }

    /// Whether report lines go to stdout as JSON, so logs must go elsewhere
    pub fn json_on_stdout(&self) -> bool {
        self.json && self.output.is_none()
    }
}
