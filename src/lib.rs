//! # Market OCR
//!
//! Turns OCR text read from a market grid screenshot into structured product
//! data. The heart of the crate is [`product_matcher::ProductMatcher`], which
//! corrects noisy product names against a fixed catalog using a bigram index
//! and a curated table of OCR character confusions.

pub mod catalog;
pub mod errors;
pub mod features;
pub mod matcher_config;
pub mod observability;
pub mod observability_config;
pub mod product_matcher;
pub mod scan;
pub mod substitution;
pub mod text_cleaning;

// Re-export types for easier access
pub use product_matcher::{Correction, MatchPath, ProductMatcher};
pub use scan::{GridLayout, ScanReport, ScanSession, SlotPosition};
