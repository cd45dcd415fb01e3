//! # Product Catalog Module
//!
//! The catalog is the fixed, ordered list of product names the market grid
//! can show. It is validated and indexed once at construction and read-only
//! afterwards.
//!
//! The [`CatalogIndex`] maps every bigram that identifies exactly one entry
//! to that entry. Bigrams shared by two or more entries carry no
//! discriminating power and are left out entirely.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::features::{extract_catalog_features, Bigram, FeatureSet};

/// The twelve goods groups sold on the market grid
pub const DEFAULT_PRODUCTS: [&str; 12] = [
    "锚点厨具货组",
    "悬空鼷兽骨雕货组",
    "巫术矿钻货组",
    "天使罐头货组",
    "谷地水培肉货组",
    "团结牌口服液货组",
    "源石树幼苗货组",
    "赛什卡髀石货组",
    "警戒者矿镐货组",
    "硬脑壳头盔货组",
    "边角料积木货组",
    "星体晶块货组",
];

/// Suffix shared by nearly every product name ("goods group")
pub const DEFAULT_COMMON_SUFFIX: [char; 2] = ['货', '组'];

/// A catalog entry together with its precomputed features
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub name: String,
    pub features: FeatureSet,
}

/// Ordered, validated list of known product names
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    common_suffix: [char; 2],
}

impl Catalog {
    /// Validate the names and compute each entry's features
    pub fn new<S: AsRef<str>>(names: &[S], common_suffix: [char; 2]) -> AppResult<Self> {
        validate_names(names)?;
        Ok(Self::build(names, common_suffix))
    }

    /// Build without validation, for names known to be well-formed
    pub(crate) fn build<S: AsRef<str>>(names: &[S], common_suffix: [char; 2]) -> Self {
        let entries = names
            .iter()
            .map(|name| CatalogEntry {
                name: name.as_ref().to_string(),
                features: extract_catalog_features(name.as_ref(), common_suffix),
            })
            .collect();
        Self {
            entries,
            common_suffix,
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, position: usize) -> Option<&CatalogEntry> {
        self.entries.get(position)
    }

    /// Position of an exact entry name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn common_suffix(&self) -> [char; 2] {
        self.common_suffix
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::build(&DEFAULT_PRODUCTS, DEFAULT_COMMON_SUFFIX)
    }
}

/// Check a list of catalog names for configuration mistakes
pub fn validate_names<S: AsRef<str>>(names: &[S]) -> AppResult<()> {
    if names.is_empty() {
        return Err(AppError::Config("Catalog cannot be empty".to_string()));
    }

    let mut seen = HashSet::new();
    for name in names {
        let name = name.as_ref();
        if name.chars().count() < 2 {
            return Err(AppError::Config(format!(
                "Catalog entry '{}' must have at least 2 characters",
                name
            )));
        }
        if !seen.insert(name) {
            return Err(AppError::Config(format!(
                "Catalog entry '{}' is duplicated",
                name
            )));
        }
    }

    Ok(())
}

/// Lookup table from an unambiguous bigram to the single entry containing it
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    index: HashMap<Bigram, usize>,
    ambiguous: HashSet<Bigram>,
}

impl CatalogIndex {
    /// Build the index from every entry's catalog features
    pub fn build(catalog: &Catalog) -> Self {
        let mut index: HashMap<Bigram, usize> = HashMap::new();
        let mut ambiguous = HashSet::new();

        for (position, entry) in catalog.entries().iter().enumerate() {
            for bigram in entry.features.iter() {
                match index.get(bigram) {
                    Some(existing) if *existing != position => {
                        ambiguous.insert(*bigram);
                    }
                    Some(_) => {}
                    None => {
                        index.insert(*bigram, position);
                    }
                }
            }
        }

        index.retain(|bigram, _| !ambiguous.contains(bigram));

        debug!(
            entries = catalog.len(),
            indexed_bigrams = index.len(),
            ambiguous_bigrams = ambiguous.len(),
            "Catalog index built"
        );

        Self { index, ambiguous }
    }

    /// Position of the unique entry owning this bigram
    pub fn lookup(&self, bigram: &Bigram) -> Option<usize> {
        self.index.get(bigram).copied()
    }

    pub fn is_ambiguous(&self, bigram: &Bigram) -> bool {
        self.ambiguous.contains(bigram)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn ambiguous_len(&self) -> usize {
        self.ambiguous.len()
    }
}
