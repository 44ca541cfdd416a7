// src/main.rs
use anyhow::Context;
use clap::Parser;
use crt_expiry::cli::Cli;
use crt_expiry::config::Config;
use crt_expiry::crtsh::CrtShClient;
use crt_expiry::output::{self, json::JsonOutput, log::LogOutput, OutputHandler};
use crt_expiry::pipeline::Pipeline;
use crt_expiry::report::build_report;
use crt_expiry::verify::{LiveVerifier, TlsProbe};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Validate arguments
    cli.validate()?;

    // Load config file if one was given
    let mut config = match cli.config {
        Some(ref path) => Config::from_file(Path::new(path))
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => Config::default(),
    };

    // Apply CLI overrides
    cli.apply(&mut config);

    // Initialize logging
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level(&config.logging.level)));

    // Keep stdout clean for JSON lines
    let writer = if cli.json_on_stdout() {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .init();

    // Create output handler before doing any network work
    let output_handler: Box<dyn OutputHandler> = if cli.json {
        match cli.output {
            Some(ref path) => {
                let file = std::fs::File::create(path)
                    .with_context(|| format!("Failed to create output file {}", path))?;
                tracing::debug!("Writing JSON output to: {}", path);
                Box::new(JsonOutput::to_file(file))
            }
            None => Box::new(JsonOutput::new()),
        }
    } else {
        Box::new(LogOutput)
    };

    let source = Arc::new(CrtShClient::new(&config.crtsh)?);
    let mut pipeline = Pipeline::new(source, config.filter.policy());

    if config.verify.enabled {
        let probe = TlsProbe::new(
            config.verify.port,
            Duration::from_secs(config.verify.timeout_secs),
        )?;
        pipeline = pipeline.with_verifier(LiveVerifier::new(Arc::new(probe)));
    } else {
        tracing::debug!("Live verification disabled");
    }

    let sites = pipeline.run(&cli.domain).await;

    // Report
    let lines = build_report(&sites);
    output::emit_report(output_handler.as_ref(), &lines).await?;

    Ok(())
}
