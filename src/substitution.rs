//! # OCR Substitution Table
//!
//! Character-level corrections for glyphs the OCR engine is known to confuse
//! on the market grid. Applied to every input before matching.

use std::collections::{BTreeMap, HashMap};

use crate::errors::{AppError, AppResult};

/// Observed OCR confusions: wrong glyph -> intended text
const DEFAULT_SUBSTITUTIONS: [(char, &str); 12] = [
    ('锁', "锚"), // 锁点 -> 锚点
    ('和', "货"), // 和任组 -> 货组
    ('任', "组"),
    ('吴', "鼷"), // 吴胃 -> 鼷兽
    ('胃', "兽"),
    ('偶', "货"), // 偶组 -> 货组
    ('蛙', "赛"), // 蛙什卡 -> 赛什卡
    ('体', "髀"), // 体石 -> 髀石
    ('旺', "晶"),
    ('4', "星体晶块"),
    ('备', "盔"),
    ('帝', "壳"),
];

/// Default substitution pairs, in curation order
pub fn default_substitutions() -> BTreeMap<char, String> {
    DEFAULT_SUBSTITUTIONS
        .iter()
        .map(|(from, to)| (*from, to.to_string()))
        .collect()
}

/// Mapping from a wrong character to its replacement text
#[derive(Debug, Clone, Default)]
pub struct SubstitutionTable {
    replacements: HashMap<char, String>,
}

impl SubstitutionTable {
    /// Build a table, rejecting empty replacements
    pub fn from_pairs<I, S>(pairs: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = (char, S)>,
        S: Into<String>,
    {
        let mut replacements = HashMap::new();
        for (from, to) in pairs {
            let to = to.into();
            if to.is_empty() {
                return Err(AppError::Config(format!(
                    "Substitution for '{}' cannot be empty",
                    from
                )));
            }
            replacements.insert(from, to);
        }
        Ok(Self { replacements })
    }

    /// The curated table for the market grid font
    pub fn curated() -> Self {
        Self {
            replacements: default_substitutions().into_iter().collect(),
        }
    }

    pub fn get(&self, wrong: char) -> Option<&str> {
        self.replacements.get(&wrong).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    /// Replace every known wrong character in a single left-to-right pass.
    ///
    /// Replacement output is never re-scanned: "4" becomes "星体晶块" even
    /// though "体" is itself a substitution source.
    pub fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match self.replacements.get(&c) {
                Some(replacement) => out.push_str(replacement),
                None => out.push(c),
            }
        }
        out
    }
}
