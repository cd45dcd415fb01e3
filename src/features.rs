//! # Feature Extraction Module
//!
//! Product names are compared through their adjacent-character pairs
//! ("bigrams"). This module turns catalog entries and OCR text into ordered,
//! de-duplicated bigram sets and scores how much of a candidate's set a query
//! reproduces.

use std::collections::HashSet;
use std::fmt;

/// An ordered pair of two adjacent characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bigram(pub char, pub char);

impl fmt::Display for Bigram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0, self.1)
    }
}

/// Set of bigrams that keeps first-insertion order.
///
/// Iteration order is the order in which bigrams first appear in the source
/// text, so the indexed fast path is reproducible from run to run.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    ordered: Vec<Bigram>,
    members: HashSet<Bigram>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a bigram, returning false if it was already present
    pub fn insert(&mut self, bigram: Bigram) -> bool {
        if self.members.insert(bigram) {
            self.ordered.push(bigram);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, bigram: &Bigram) -> bool {
        self.members.contains(bigram)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bigram> {
        self.ordered.iter()
    }

    /// Number of bigrams present in both sets
    pub fn intersection_count(&self, other: &FeatureSet) -> usize {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().filter(|b| large.contains(*b)).count()
    }
}

impl FromIterator<Bigram> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Bigram>>(iter: I) -> Self {
        let mut set = FeatureSet::new();
        for bigram in iter {
            set.insert(bigram);
        }
        set
    }
}

/// Extract the plain sliding-window bigrams of a text.
///
/// Used for OCR query strings. Texts shorter than two characters have no
/// features.
pub fn extract_text_features(text: &str) -> FeatureSet {
    let chars: Vec<char> = text.chars().collect();
    chars.windows(2).map(|pair| Bigram(pair[0], pair[1])).collect()
}

/// Extract the features of a catalog entry.
///
/// Two policies apply on top of the sliding window:
/// - the common suffix pair (e.g. "货组") is skipped, it appears in nearly
///   every entry and only produces ambiguity;
/// - entries of three or more characters get one extra pair made of the
///   first character and the last character that does not belong to the
///   suffix, which keeps some identity when OCR garbles the middle.
pub fn extract_catalog_features(entry: &str, suffix: [char; 2]) -> FeatureSet {
    let chars: Vec<char> = entry.chars().collect();
    let suffix_pair = Bigram(suffix[0], suffix[1]);

    let mut features: FeatureSet = chars
        .windows(2)
        .map(|pair| Bigram(pair[0], pair[1]))
        .filter(|bigram| *bigram != suffix_pair)
        .collect();

    if chars.len() >= 3 {
        let first = chars[0];
        if let Some(last) = chars.iter().rev().copied().find(|c| !suffix.contains(c)) {
            features.insert(Bigram(first, last));
        }
    }

    features
}

/// Fraction of the candidate's features reproduced by the query.
///
/// The denominator is the candidate's size, so a short query is not punished
/// for features it never saw, only for covering little of the candidate.
pub fn match_score(query: &FeatureSet, candidate: &FeatureSet) -> f64 {
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    query.intersection_count(candidate) as f64 / candidate.len() as f64
}
