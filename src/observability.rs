//! Observability module for structured logging and metrics.
//!
//! This module provides:
//! - Structured logging setup (JSON or pretty output)
//! - Tracing span creation utilities
//! - Metrics recording functions for corrections and scans
//!
//! Metrics go through the `metrics` facade; recording is a no-op until the
//! embedding application installs a recorder.

use anyhow::Result;
use tracing_subscriber::prelude::*;

use crate::observability_config::ObservabilityConfig;
use crate::product_matcher::MatchPath;

/// Initialize structured logging with tracing and configuration
pub fn init_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("market_ocr={}", config.log_level).parse()?);

    if config.use_pretty_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Create a span for a single product name correction
pub fn correction_span(ocr_text: &str) -> tracing::Span {
    tracing::debug_span!(
        "product_correction",
        ocr_text = ocr_text,
        component = "matcher"
    )
}

/// Create a span for assembling one capture of the market grid
pub fn scan_span(timestamp: &str) -> tracing::Span {
    tracing::info_span!("scan_session", timestamp = timestamp, component = "scan")
}

/// Record the outcome of one product name correction
pub fn record_correction_metrics(path: MatchPath, confidence: f64) {
    metrics::counter!("product_corrections_total", "path" => path.as_str()).increment(1);
    if confidence > 0.0 {
        metrics::histogram!("product_correction_confidence", "path" => path.as_str())
            .record(confidence);
    }
}

/// Record the counts of a finished scan session
pub fn record_scan_metrics(total: usize, corrected: usize, complete: usize) {
    metrics::counter!("scan_sessions_total").increment(1);
    metrics::histogram!("scan_slots").record(total as f64);
    metrics::histogram!("scan_corrected_names").record(corrected as f64);
    metrics::histogram!("scan_complete_slots").record(complete as f64);
}

/// Record a configuration or input error by component
pub fn record_error_metrics(error_type: &str, component: &str) {
    let error_type = error_type.to_string();
    let component = component.to_string();
    metrics::counter!("errors_total", "type" => error_type, "component" => component).increment(1);
}
