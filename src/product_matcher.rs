//! # Product Name Correction Module
//!
//! Maps noisy OCR output for a market grid cell to one of the known product
//! names. The matcher tries, in order:
//!
//! - an exact catalog match of the cleaned text
//! - the indexed fast path: a query bigram owned by a single catalog entry
//!   nominates that entry, accepted at the fast path threshold
//! - a full scan scoring every entry, accepted at the full scan threshold
//!
//! Anything else is a "no match": an empty name with zero confidence. The
//! matcher never returns an error for any input.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::catalog::{Catalog, CatalogEntry, CatalogIndex};
use crate::errors::AppResult;
use crate::features::{extract_text_features, match_score};
use crate::matcher_config::{
    MatcherConfig, DEFAULT_FAST_PATH_THRESHOLD, DEFAULT_FULL_SCAN_THRESHOLD,
};
use crate::observability;
use crate::substitution::SubstitutionTable;

lazy_static! {
    // Unicode-aware: CJK ideographs count as word characters
    static ref NON_WORD: Regex = Regex::new(r"[\s\W]+").expect("non-word pattern should be valid");
}

/// Result of correcting one OCR string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    /// Catalog entry, or empty when nothing matched
    pub name: String,
    /// Match confidence in [0.0, 1.0]
    pub confidence: f64,
}

impl Correction {
    pub fn no_match() -> Self {
        Self {
            name: String::new(),
            confidence: 0.0,
        }
    }

    fn matched(name: &str, confidence: f64) -> Self {
        Self {
            name: name.to_string(),
            confidence,
        }
    }

    pub fn is_match(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Which step of the matcher produced a correction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchPath {
    /// Input was empty or whitespace only
    Empty,
    /// Cleaned text equals a catalog entry
    Exact,
    /// Candidate nominated by an unambiguous indexed bigram
    Indexed,
    /// Best candidate of the full catalog scan
    FullScan,
    /// Nothing reached its threshold
    NoMatch,
}

impl MatchPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPath::Empty => "empty",
            MatchPath::Exact => "exact",
            MatchPath::Indexed => "indexed",
            MatchPath::FullScan => "full_scan",
            MatchPath::NoMatch => "no_match",
        }
    }
}

/// Immutable product name corrector.
///
/// Build it once at startup and share it by reference (or `Arc`); every
/// method takes `&self` and there is no interior mutability, so concurrent
/// calls need no synchronization.
#[derive(Debug, Clone)]
pub struct ProductMatcher {
    catalog: Catalog,
    index: CatalogIndex,
    substitutions: SubstitutionTable,
    fast_path_threshold: f64,
    full_scan_threshold: f64,
}

impl ProductMatcher {
    /// Create a matcher for the built-in market catalog
    pub fn new() -> Self {
        let catalog = Catalog::default();
        let index = CatalogIndex::build(&catalog);
        Self {
            catalog,
            index,
            substitutions: SubstitutionTable::curated(),
            fast_path_threshold: DEFAULT_FAST_PATH_THRESHOLD,
            full_scan_threshold: DEFAULT_FULL_SCAN_THRESHOLD,
        }
    }

    /// Create a matcher from a custom configuration, validating it first
    pub fn with_config(config: MatcherConfig) -> AppResult<Self> {
        config.validate()?;

        let catalog = Catalog::new(&config.catalog, config.common_suffix)?;
        let index = CatalogIndex::build(&catalog);
        let substitutions = SubstitutionTable::from_pairs(config.substitutions)?;

        debug!(
            entries = catalog.len(),
            substitutions = substitutions.len(),
            fast_path_threshold = config.fast_path_threshold,
            full_scan_threshold = config.full_scan_threshold,
            "Product matcher configured"
        );

        Ok(Self {
            catalog,
            index,
            substitutions,
            fast_path_threshold: config.fast_path_threshold,
            full_scan_threshold: config.full_scan_threshold,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    pub fn substitutions(&self) -> &SubstitutionTable {
        &self.substitutions
    }

    /// Strip whitespace and punctuation, then apply the substitution table
    pub fn preprocess(&self, text: &str) -> String {
        self.substitutions.apply(&strip_non_word(text))
    }

    /// Correct one OCR string
    pub fn correct(&self, ocr_text: &str) -> Correction {
        self.correct_with_path(ocr_text).0
    }

    /// Correct one OCR string and report which step decided the result
    pub fn correct_with_path(&self, ocr_text: &str) -> (Correction, MatchPath) {
        let _span = observability::correction_span(ocr_text).entered();
        let (correction, path) = self.run_pipeline(ocr_text);

        trace!(
            input = %ocr_text,
            corrected = %correction.name,
            confidence = correction.confidence,
            path = path.as_str(),
            "Product name correction"
        );
        observability::record_correction_metrics(path, correction.confidence);

        (correction, path)
    }

    fn run_pipeline(&self, ocr_text: &str) -> (Correction, MatchPath) {
        if ocr_text.trim().is_empty() {
            return (Correction::no_match(), MatchPath::Empty);
        }

        // A catalog name read correctly must not be damaged by a substitution
        // aimed at another name (体 -> 髀 vs 星体晶块货组).
        let stripped = strip_non_word(ocr_text);
        if let Some(entry) = self.exact_entry(&stripped) {
            return (Correction::matched(&entry.name, 1.0), MatchPath::Exact);
        }

        let processed = self.substitutions.apply(&stripped);
        if let Some(entry) = self.exact_entry(&processed) {
            return (Correction::matched(&entry.name, 1.0), MatchPath::Exact);
        }

        let query = extract_text_features(&processed);
        if query.is_empty() {
            return (Correction::no_match(), MatchPath::NoMatch);
        }

        for bigram in query.iter() {
            let Some(position) = self.index.lookup(bigram) else {
                continue;
            };
            let Some(candidate) = self.catalog.get(position) else {
                continue;
            };
            let score = match_score(&query, &candidate.features);
            trace!(
                bigram = %bigram,
                candidate = %candidate.name,
                score = score,
                "Indexed candidate"
            );
            if score >= self.fast_path_threshold {
                return (
                    Correction::matched(&candidate.name, score),
                    MatchPath::Indexed,
                );
            }
        }

        let mut best: Option<(&CatalogEntry, f64)> = None;
        for entry in self.catalog.entries() {
            let score = match_score(&query, &entry.features);
            let best_score = best.map_or(0.0, |(_, s)| s);
            if score > best_score {
                best = Some((entry, score));
            }
        }

        match best {
            Some((entry, score)) if score >= self.full_scan_threshold => {
                (Correction::matched(&entry.name, score), MatchPath::FullScan)
            }
            _ => (Correction::no_match(), MatchPath::NoMatch),
        }
    }

    fn exact_entry(&self, text: &str) -> Option<&CatalogEntry> {
        self.catalog
            .position(text)
            .and_then(|position| self.catalog.get(position))
    }

    /// Correct several OCR strings, preserving order
    pub fn batch_correct<S: AsRef<str>>(&self, ocr_texts: &[S]) -> Vec<Correction> {
        ocr_texts
            .iter()
            .map(|text| self.correct(text.as_ref()))
            .collect()
    }

    /// Whether a corrected name is a verbatim catalog member
    pub fn validate_correction(&self, corrected: &str) -> bool {
        !corrected.is_empty() && self.catalog.contains(corrected)
    }
}

impl Default for ProductMatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_non_word(text: &str) -> String {
    NON_WORD.replace_all(text, "").into_owned()
}
