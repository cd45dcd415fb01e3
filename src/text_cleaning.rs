//! # OCR Text Cleaning Module
//!
//! Normalises the raw text an OCR engine returns for the two regions of a
//! market grid cell: the product name line and the unit price line.
//!
//! Both patterns are compiled once and shared, so cleaning is safe to call
//! from any thread.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("whitespace pattern should be valid");
    // CJK unified ideographs, ASCII alphanumerics and common CJK punctuation
    static ref NAME_DISALLOWED: Regex = Regex::new(
        r#"[^\x{4e00}-\x{9fa5}a-zA-Z0-9，。！？、：；"'（）《》【】]"#
    )
    .expect("name filter pattern should be valid");
    static ref DIGIT_RUN: Regex = Regex::new(r"[0-9]+").expect("digit pattern should be valid");
}

/// Clean a recognised product name line.
///
/// Removes all whitespace, then drops every character outside the CJK
/// ideograph range, ASCII letters/digits and common punctuation. Stray
/// symbols from the cell border are the usual victims.
pub fn clean_name_text(raw: &str) -> String {
    let compact = WHITESPACE.replace_all(raw, "");
    NAME_DISALLOWED.replace_all(&compact, "").into_owned()
}

/// Extract the digits of a recognised price line.
///
/// Every run of ASCII digits is concatenated in order, so a thousands gap
/// read as a space ("1 234") still yields "1234". Returns `None` when the
/// text holds no digit.
pub fn parse_price_text(raw: &str) -> Option<String> {
    let digits: String = DIGIT_RUN
        .find_iter(raw)
        .map(|m| m.as_str())
        .collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Numeric value of a recognised price line, `None` if absent or too large
pub fn parse_price_value(raw: &str) -> Option<u64> {
    parse_price_text(raw)?.parse().ok()
}
