//! # Scan Session Module
//!
//! Assembles the OCR text of one capture of the market grid into per-slot
//! product records. Each grid cell yields a name line and a price line; the
//! name is cleaned and corrected against the catalog, the price reduced to
//! its digits.
//!
//! Slots are keyed by their product index, counted row by row from 1:
//! `(row - 1) * columns + col`.

use std::collections::BTreeMap;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{error_logging, AppError, AppResult};
use crate::observability;
use crate::product_matcher::ProductMatcher;
use crate::text_cleaning::{clean_name_text, parse_price_text};

/// Timestamp format used to label a capture
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Shape of the market grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub rows: u32,
    pub columns: u32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            rows: 2,
            columns: 7,
        }
    }
}

impl GridLayout {
    /// Validate grid dimensions
    pub fn validate(&self) -> AppResult<()> {
        if self.rows == 0 || self.columns == 0 {
            return Err(AppError::Config(format!(
                "Grid layout must have at least one row and column, got {}x{}",
                self.rows, self.columns
            )));
        }
        if self.rows.checked_mul(self.columns).is_none() {
            return Err(AppError::Config(format!(
                "Grid layout {}x{} has more slots than can be indexed",
                self.rows, self.columns
            )));
        }
        Ok(())
    }

    pub fn contains(&self, position: SlotPosition) -> bool {
        (1..=self.rows).contains(&position.row) && (1..=self.columns).contains(&position.col)
    }

    pub fn slot_count(&self) -> u32 {
        self.rows * self.columns
    }
}

/// 1-based cell position in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotPosition {
    pub row: u32,
    pub col: u32,
}

impl SlotPosition {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// 1-based product index for a grid with `columns` columns.
    ///
    /// The position must lie inside a validated layout.
    pub fn product_index(&self, columns: u32) -> u32 {
        (self.row - 1) * columns + self.col
    }
}

/// Recognised data for one grid slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub position: SlotPosition,
    /// Corrected catalog name, or the cleaned OCR text when nothing matched
    pub name: String,
    /// Unit price digits, empty when none were read
    pub price: String,
    /// Cleaned OCR text before correction
    pub name_raw: String,
    /// Whether `name` came from the catalog
    pub name_corrected: bool,
    /// Confidence of the catalog match, 0.0 when uncorrected
    pub confidence: f64,
}

impl SlotRecord {
    fn empty(position: SlotPosition) -> Self {
        Self {
            position,
            name: String::new(),
            price: String::new(),
            name_raw: String::new(),
            name_corrected: false,
            confidence: 0.0,
        }
    }

    /// Both a name and a price were recognised
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.price.is_empty()
    }

    pub fn price_value(&self) -> Option<u64> {
        self.price.parse().ok()
    }
}

/// Counts describing how much of a capture was recognised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total: usize,
    pub raw_names: usize,
    pub corrected: usize,
    pub named: usize,
    pub priced: usize,
    pub complete: usize,
}

/// Finished capture, ready for the caller to persist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub timestamp: String,
    pub layout: GridLayout,
    pub slots: BTreeMap<u32, SlotRecord>,
    pub summary: ScanSummary,
}

/// Per-capture accumulator of slot records
#[derive(Debug, Clone)]
pub struct ScanSession {
    timestamp: String,
    layout: GridLayout,
    slots: BTreeMap<u32, SlotRecord>,
}

impl ScanSession {
    /// Start a session labelled with the current local time
    pub fn new(layout: GridLayout) -> AppResult<Self> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        Self::with_timestamp(timestamp, layout)
    }

    /// Start a session with an explicit label
    pub fn with_timestamp(timestamp: impl Into<String>, layout: GridLayout) -> AppResult<Self> {
        layout.validate()?;
        Ok(Self {
            timestamp: timestamp.into(),
            layout,
            slots: BTreeMap::new(),
        })
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    /// Record the OCR text of a slot's name line
    pub fn record_name(
        &mut self,
        position: SlotPosition,
        raw_text: &str,
        matcher: &ProductMatcher,
    ) -> AppResult<&SlotRecord> {
        self.check_position(position, "record_name", raw_text)?;

        let cleaned = clean_name_text(raw_text);
        let correction = matcher.correct(&cleaned);

        if correction.is_match() {
            debug!(
                row = position.row,
                col = position.col,
                raw = %cleaned,
                corrected = %correction.name,
                confidence = correction.confidence,
                "Slot name corrected"
            );
        } else {
            debug!(
                row = position.row,
                col = position.col,
                raw = %cleaned,
                "Slot name kept uncorrected"
            );
        }

        let record = self.slot_mut(position);
        record.name_corrected = correction.is_match();
        record.confidence = correction.confidence;
        record.name = if correction.is_match() {
            correction.name
        } else {
            cleaned.clone()
        };
        record.name_raw = cleaned;
        Ok(&*record)
    }

    /// Record the OCR text of a slot's price line
    pub fn record_price(&mut self, position: SlotPosition, raw_text: &str) -> AppResult<&SlotRecord> {
        self.check_position(position, "record_price", raw_text)?;

        let price = parse_price_text(raw_text).unwrap_or_default();
        if price.is_empty() {
            debug!(row = position.row, col = position.col, "No price digits recognised");
        }

        let record = self.slot_mut(position);
        record.price = price;
        Ok(&*record)
    }

    /// Record at a given product index
    pub fn get(&self, product_index: u32) -> Option<&SlotRecord> {
        self.slots.get(&product_index)
    }

    /// Records ordered by product index
    pub fn slots(&self) -> impl Iterator<Item = (u32, &SlotRecord)> {
        self.slots.iter().map(|(index, record)| (*index, record))
    }

    pub fn summary(&self) -> ScanSummary {
        let records = self.slots.values();
        let mut summary = ScanSummary {
            total: self.slots.len(),
            ..Default::default()
        };
        for record in records {
            if !record.name_raw.is_empty() {
                summary.raw_names += 1;
            }
            if record.name_corrected {
                summary.corrected += 1;
            }
            if !record.name.is_empty() {
                summary.named += 1;
            }
            if !record.price.is_empty() {
                summary.priced += 1;
            }
            if record.is_complete() {
                summary.complete += 1;
            }
        }
        summary
    }

    /// Close the session and produce its report
    pub fn finish(self) -> ScanReport {
        let _span = observability::scan_span(&self.timestamp).entered();
        let summary = self.summary();

        info!(
            total = summary.total,
            raw_names = summary.raw_names,
            corrected = summary.corrected,
            priced = summary.priced,
            complete = summary.complete,
            "Scan session finished"
        );
        observability::record_scan_metrics(summary.total, summary.corrected, summary.complete);

        ScanReport {
            timestamp: self.timestamp,
            layout: self.layout,
            slots: self.slots,
            summary,
        }
    }

    fn check_position(&self, position: SlotPosition, operation: &str, raw_text: &str) -> AppResult<()> {
        if self.layout.contains(position) {
            return Ok(());
        }
        let error = AppError::Validation(format!(
            "Slot ({}, {}) is outside the {}x{} grid",
            position.row, position.col, self.layout.rows, self.layout.columns
        ));
        error_logging::log_scan_error(
            &error,
            operation,
            Some(position.row),
            Some(position.col),
            Some(raw_text),
        );
        observability::record_error_metrics("validation", "scan");
        Err(error)
    }

    fn slot_mut(&mut self, position: SlotPosition) -> &mut SlotRecord {
        let index = position.product_index(self.layout.columns);
        self.slots
            .entry(index)
            .or_insert_with(|| SlotRecord::empty(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_index() {
        assert_eq!(SlotPosition::new(1, 1).product_index(7), 1);
        assert_eq!(SlotPosition::new(1, 7).product_index(7), 7);
        assert_eq!(SlotPosition::new(2, 1).product_index(7), 8);
        assert_eq!(SlotPosition::new(2, 7).product_index(7), 14);
    }

    #[test]
    fn test_layout_contains() {
        let layout = GridLayout::default();
        assert_eq!(layout.slot_count(), 14);
        assert!(layout.contains(SlotPosition::new(2, 7)));
        assert!(!layout.contains(SlotPosition::new(0, 1)));
        assert!(!layout.contains(SlotPosition::new(3, 1)));
        assert!(!layout.contains(SlotPosition::new(1, 8)));
    }

    #[test]
    fn test_layout_validation() {
        let layout = GridLayout { rows: 0, columns: 7 };
        assert!(matches!(layout.validate(), Err(AppError::Config(_))));
        assert!(ScanSession::with_timestamp("t", layout).is_err());
    }

    #[test]
    fn test_layout_too_large_to_index() {
        let layout = GridLayout {
            rows: 70_000,
            columns: 70_000,
        };
        assert!(matches!(layout.validate(), Err(AppError::Config(_))));
        assert!(ScanSession::with_timestamp("t", layout).is_err());

        let widest = GridLayout {
            rows: 1,
            columns: u32::MAX,
        };
        assert!(widest.validate().is_ok());
        let mut session = ScanSession::with_timestamp("t", widest).unwrap();
        let record = session.record_price(SlotPosition::new(1, u32::MAX), "5").unwrap();
        assert_eq!(record.price, "5");
        assert!(session.get(u32::MAX).is_some());
    }

    #[test]
    fn test_new_session_timestamp_format() {
        let session = ScanSession::new(GridLayout::default()).unwrap();
        // 20240101_120000
        assert_eq!(session.timestamp().len(), 15);
        assert_eq!(session.timestamp().as_bytes()[8], b'_');
    }

    #[test]
    fn test_price_only_slot() {
        let mut session = ScanSession::with_timestamp("t", GridLayout::default()).unwrap();
        let record = session.record_price(SlotPosition::new(1, 2), " 1 200 ").unwrap();
        assert_eq!(record.price, "1200");
        assert_eq!(record.price_value(), Some(1200));
        assert!(!record.is_complete());
        assert!(session.get(2).is_some());
    }
}
