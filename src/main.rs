use anyhow::{Context, Result};
use market_ocr::errors::error_logging;
use market_ocr::matcher_config::load_matcher_config;
use market_ocr::observability;
use market_ocr::observability_config::ObservabilityConfig;
use market_ocr::{GridLayout, ProductMatcher, ScanSession, SlotPosition};
use serde::Serialize;
use std::env;
use std::fs;
use std::io::{self, Read};
use tracing::{info, warn};

const USAGE: &str = "Usage:
  market-ocr correct <text>...   correct product names read by OCR
  market-ocr scan [file]         assemble TSV lines (row, col, name, price) from a file or stdin";

#[derive(Serialize)]
struct CorrectionOutput<'a> {
    input: &'a str,
    name: String,
    confidence: f64,
    path: &'static str,
}

/// Validate observability configuration and start logging
fn init_logging() -> Result<()> {
    let config = ObservabilityConfig::from_env();
    config.validate().map_err(|e| {
        anyhow::anyhow!("Observability configuration validation failed: {}", e)
    })?;
    observability::init_tracing_with_config(&config)
}

/// Load and validate the matcher configuration at startup
fn build_matcher() -> Result<ProductMatcher> {
    let config = load_matcher_config();
    let matcher = ProductMatcher::with_config(config).map_err(|e| {
        error_logging::log_config_error(&e, "matcher", "build_matcher");
        anyhow::anyhow!("Matcher configuration validation failed: {}. Please check your config/matcher.json file.", e)
    })?;

    info!(
        catalog_entries = matcher.catalog().len(),
        indexed_bigrams = matcher.index().len(),
        "Product matcher ready"
    );
    Ok(matcher)
}

/// Read grid layout overrides from GRID_ROWS / GRID_COLUMNS
fn grid_layout_from_env() -> Result<GridLayout> {
    let defaults = GridLayout::default();
    let rows = env::var("GRID_ROWS")
        .unwrap_or_else(|_| defaults.rows.to_string())
        .parse::<u32>()
        .map_err(|_| anyhow::anyhow!("GRID_ROWS must be a valid number"))?;
    let columns = env::var("GRID_COLUMNS")
        .unwrap_or_else(|_| defaults.columns.to_string())
        .parse::<u32>()
        .map_err(|_| anyhow::anyhow!("GRID_COLUMNS must be a valid number"))?;
    Ok(GridLayout { rows, columns })
}

fn run_correct(matcher: &ProductMatcher, texts: &[String]) -> Result<()> {
    if texts.is_empty() {
        return Err(anyhow::anyhow!("correct needs at least one text\n{}", USAGE));
    }

    for text in texts {
        let (correction, path) = matcher.correct_with_path(text);
        let output = CorrectionOutput {
            input: text,
            name: correction.name,
            confidence: correction.confidence,
            path: path.as_str(),
        };
        println!("{}", serde_json::to_string(&output)?);
    }
    Ok(())
}

fn run_scan(matcher: &ProductMatcher, source: Option<&str>) -> Result<()> {
    let input = match source {
        Some(path) => fs::read_to_string(path)
            .inspect_err(|e| error_logging::log_io_error(e, "run_scan", Some(path)))
            .with_context(|| format!("Failed to read {}", path))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let mut session = ScanSession::new(grid_layout_from_env()?)?;

    for (line_number, line) in input.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        let position = match (fields.first(), fields.get(1)) {
            (Some(row), Some(col)) => match (row.trim().parse::<u32>(), col.trim().parse::<u32>()) {
                (Ok(row), Ok(col)) => SlotPosition::new(row, col),
                _ => {
                    warn!(line = line_number + 1, "Skipping line with invalid row/col");
                    continue;
                }
            },
            _ => {
                warn!(line = line_number + 1, "Skipping line without row/col");
                continue;
            }
        };

        if let Some(name) = fields.get(2) {
            if let Err(e) = session.record_name(position, name, matcher) {
                warn!(line = line_number + 1, error = %e, "Skipping name");
            }
        }
        if let Some(price) = fields.get(3) {
            if let Err(e) = session.record_price(position, price) {
                warn!(line = line_number + 1, error = %e, "Skipping price");
            }
        }
    }

    let report = session.finish();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    init_logging()?;

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    let matcher = build_matcher()?;

    match command.as_str() {
        "correct" => run_correct(&matcher, &args[1..]),
        "scan" => run_scan(&matcher, args.get(1).map(String::as_str)),
        other => Err(anyhow::anyhow!("Unknown command '{}'\n{}", other, USAGE)),
    }
}
