//! Solana address pattern matcher
//!
//! Recognizes candidate address tokens inside free-form text: maximal
//! word-bounded runs of 32-44 base-58 characters. Format only, no
//! on-curve or checksum validation.
//!
//! Author: AI-Generated
//! Created: 2026-08-30

use once_cell::sync::Lazy;
use regex::Regex;

/// Base-58 alphabet: digits and letters excluding 0, O, I, l.
static SOLANA_ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[1-9A-HJ-NP-Za-km-z]{32,44}\b").unwrap());

/// Extract every non-overlapping address-shaped token from `text`,
/// in input order. Pure and stateless; multiple matches all count.
pub fn extract_candidates(text: &str) -> Vec<&str> {
    SOLANA_ADDRESS_RE.find_iter(text).map(|m| m.as_str()).collect()
}
