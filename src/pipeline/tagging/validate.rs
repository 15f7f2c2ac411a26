//! Post-extraction validation.
//!
//! Extraction is permissive by design; this filter is the gate that keeps
//! garbage out of filenames and the database. Rejections are logged at
//! debug level and otherwise silent.

use chrono::NaiveDate;
use regex::Regex;
use std::collections::BTreeMap;

pub struct ValidationFilter {
    reject_patterns: Vec<Regex>,
    symbol_run_re: Regex,
}

impl Default for ValidationFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationFilter {
    pub fn new() -> Self {
        let reject = [
            // Nothing but digits and list punctuation ("12345", "3/4").
            r"^[\d\s.,/#:;-]+$",
            // State code plus number ("CA 90210").
            r"^[A-Z]{2}\s*\d+",
            // A bare date masquerading as a name.
            r"^\s*\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\s*$",
            r"^\s*\d{4}-\d{1,2}-\d{1,2}\s*$",
            // ZIP code alone.
            r"^\s*\d{5}(?:-\d{4})?\s*$",
            r"(?i)^page\s+\d+",
            // Document-number labels that leaked through entity cleaning.
            r"(?i)^(?:invoice|receipt|statement|account|order|ref(?:erence)?|doc(?:ument)?)\s*(?:#|no\.?|num(?:ber)?)",
            r"(?i)^(?:tel|phone|fax|email|www)\b",
        ];

        Self {
            reject_patterns: reject.iter().map(|p| Regex::new(p).unwrap()).collect(),
            symbol_run_re: Regex::new(r"[^\w\s]{3,}").unwrap(),
        }
    }

    /// Whether a candidate entity name is usable.
    pub fn validate_entity(&self, candidate: &str) -> bool {
        let trimmed = candidate.trim();
        if trimmed.len() < 3 {
            return false;
        }
        if !trimmed.chars().any(|c| c.is_alphabetic()) {
            tracing::debug!(candidate = %trimmed, "Rejecting entity with no letters");
            return false;
        }
        if self.symbol_run_re.is_match(trimmed) {
            tracing::debug!(candidate = %trimmed, "Rejecting entity with symbol run");
            return false;
        }
        for pattern in &self.reject_patterns {
            if pattern.is_match(trimmed) {
                tracing::debug!(candidate = %trimmed, "Rejecting entity matching junk pattern");
                return false;
            }
        }
        true
    }

    /// Pass an extracted entity through validation, dropping it on failure.
    pub fn filter_entity(&self, candidate: Option<String>) -> Option<String> {
        candidate.filter(|c| self.validate_entity(c))
    }

    /// Keep only dates that parse as real `YYYY-MM-DD` calendar dates.
    pub fn filter_dates(&self, dates: BTreeMap<String, String>) -> BTreeMap<String, String> {
        dates
            .into_iter()
            .filter(|(key, value)| {
                let ok = NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok();
                if !ok {
                    tracing::debug!(key = %key, value = %value, "Rejecting unparseable date");
                }
                ok
            })
            .collect()
    }

    /// Trim tags and drop the ones that are empty afterwards.
    pub fn filter_tags(&self, tags: Vec<String>) -> Vec<String> {
        tags.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}
