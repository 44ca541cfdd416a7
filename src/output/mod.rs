//! Output handling for the expiry report
//!
//! A report line goes either to the tracing log (default) or to a JSON
//! Lines stream.

use crate::report::ReportLine;
use async_trait::async_trait;

pub mod json;
pub mod log;

/// Trait for output handlers that render report lines
#[async_trait]
pub trait OutputHandler: Send + Sync {
    /// Emit a single report line
    async fn emit_line(&self, line: &ReportLine) -> anyhow::Result<()>;

    /// Flush any buffered output
    async fn flush(&self) -> anyhow::Result<()>;
}

/// Emit every line in order, then flush.
///
/// Errors from individual lines are logged but don't stop the report.
pub async fn emit_report(handler: &dyn OutputHandler, lines: &[ReportLine]) -> anyhow::Result<()> {
    for line in lines {
        if let Err(e) = handler.emit_line(line).await {
            tracing::warn!("Output handler error for {}: {}", line.site, e);
        }
    }

    handler.flush().await
}
