//! Structured log output, one tracing event per site

use crate::output::OutputHandler;
use crate::report::{ReportLine, Severity};
use async_trait::async_trait;
use tracing::{error, info, warn};

/// Reports each site as a log event at the line's severity
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOutput;

#[async_trait]
impl OutputHandler for LogOutput {
    async fn emit_line(&self, line: &ReportLine) -> anyhow::Result<()> {
        match line.severity {
            Severity::Warn => warn!(
                NotAfter = %line.not_after,
                NotBefore = %line.not_before,
                TimeLeft = %line.time_left,
                Expired = line.expired,
                "{}",
                line.site
            ),
            Severity::Error => error!(
                NotAfter = %line.not_after,
                NotBefore = %line.not_before,
                TimeLeft = %line.time_left,
                Expired = line.expired,
                Actual = %line.actual.as_deref().unwrap_or_default(),
                "{}",
                line.site
            ),
            Severity::Info => info!(
                NotAfter = %line.not_after,
                NotBefore = %line.not_before,
                TimeLeft = %line.time_left,
                Expired = line.expired,
                "{}",
                line.site
            ),
        }

        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
