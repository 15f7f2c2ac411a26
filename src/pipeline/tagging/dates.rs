//! Date extraction with contextual labeling.
//!
//! Four date shapes are recognized, tried in a fixed precedence order.
//! Dates found within 100 characters of a labeling phrase ("due date",
//! "invoice date", ...) are recorded under that context; everything else
//! lands under synthetic `doc_date_N` keys. `Month YYYY` values anchor to
//! day 01 of that month — a policy choice, not a parsing accident.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;

/// How far past a labeling phrase to look for the date itself.
const LABEL_WINDOW_BYTES: usize = 100;

const MONTHS: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sept?(?:ember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

/// The recognized date shapes, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateShape {
    /// "February 2025" — anchored to the first of the month.
    MonthYear,
    /// "January 15, 2023"
    MonthDayYear,
    /// "02/28/2023" or "02-28-23" (month first)
    MonthDaySlash,
    /// "2023-01-15" or "2023/1/15"
    YearMonthDay,
}

pub struct DateExtractor {
    shapes: Vec<(DateShape, Regex)>,
    labels: Vec<(&'static str, Vec<Regex>)>,
    max_year: i32,
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DateExtractor {
    pub fn new() -> Self {
        let shapes = vec![
            (
                DateShape::MonthYear,
                Regex::new(&format!(r"(?i)\b({MONTHS})[,.]?\s+(\d{{4}})\b")).unwrap(),
            ),
            (
                DateShape::MonthDayYear,
                Regex::new(&format!(
                    r"(?i)\b({MONTHS})[,.]?\s+(\d{{1,2}})(?:st|nd|rd|th)?\s*[,.\s]\s*(\d{{2,4}})\b"
                ))
                .unwrap(),
            ),
            (
                DateShape::MonthDaySlash,
                Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})\b").unwrap(),
            ),
            (
                DateShape::YearMonthDay,
                Regex::new(r"\b(\d{4})[/-](\d{1,2})[/-](\d{1,2})\b").unwrap(),
            ),
        ];

        let label = |patterns: &[&str]| -> Vec<Regex> {
            patterns
                .iter()
                .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
                .collect()
        };

        let labels = vec![
            (
                "invoice_date",
                label(&[r"invoice\s+date", r"date\s+of\s+invoice", r"invoice\s+dated"]),
            ),
            (
                "due_date",
                label(&[r"due\s+date", r"payment\s+due", r"due\s+by", r"pay\s+by"]),
            ),
            (
                "service_date",
                label(&[r"service\s+date", r"date\s+of\s+service"]),
            ),
            ("letter_date", label(&[r"letter\s+date", r"\bdated\b"])),
            (
                "exam_date",
                label(&[r"exam\s+date", r"examination\s+date", r"date\s+of\s+exam"]),
            ),
            (
                "report_date",
                label(&[r"report\s+date", r"reported\s+on", r"date\s+of\s+report"]),
            ),
        ];

        Self {
            shapes,
            labels,
            // Anything past next year is an OCR artifact, not a date.
            max_year: Utc::now().year() + 1,
        }
    }

    /// Extract all recognizable dates, labeled where a context phrase
    /// precedes them. Deterministic for a given text; no side effects.
    pub fn extract(&self, text: &str) -> BTreeMap<String, String> {
        let mut dates: BTreeMap<String, String> = BTreeMap::new();

        // Labeled pass: first valid date after the label wins per context.
        for (context, label_patterns) in &self.labels {
            'context: for label_re in label_patterns {
                for label_match in label_re.find_iter(text) {
                    let window = window_after(text, label_match.end());
                    for (shape, pattern) in &self.shapes {
                        if let Some(caps) = pattern.captures(window) {
                            if let Some(date) = self.normalize(*shape, &caps) {
                                dates.insert(
                                    (*context).to_string(),
                                    date.format("%Y-%m-%d").to_string(),
                                );
                                break 'context;
                            }
                        }
                    }
                }
            }
        }

        // Unlabeled pass: everything else in document order, deduplicated
        // against values already captured under a label.
        let mut unlabeled: Vec<(usize, usize, String)> = Vec::new();
        for (precedence, (shape, pattern)) in self.shapes.iter().enumerate() {
            for caps in pattern.captures_iter(text) {
                let start = caps.get(0).map_or(0, |m| m.start());
                if let Some(date) = self.normalize(*shape, &caps) {
                    unlabeled.push((start, precedence, date.format("%Y-%m-%d").to_string()));
                }
            }
        }
        unlabeled.sort();

        let mut counter = 1;
        for (_, _, value) in unlabeled {
            if dates.values().any(|v| *v == value) {
                continue;
            }
            dates.insert(format!("doc_date_{counter}"), value);
            counter += 1;
        }

        dates
    }

    fn normalize(&self, shape: DateShape, caps: &regex::Captures) -> Option<NaiveDate> {
        let date = match shape {
            DateShape::MonthYear => {
                let month = month_number(caps.get(1)?.as_str())?;
                let year: i32 = caps.get(2)?.as_str().parse().ok()?;
                NaiveDate::from_ymd_opt(year, month, 1)?
            }
            DateShape::MonthDayYear => {
                let month = month_number(caps.get(1)?.as_str())?;
                let day: u32 = caps.get(2)?.as_str().parse().ok()?;
                let year = expand_year(caps.get(3)?.as_str())?;
                NaiveDate::from_ymd_opt(year, month, day)?
            }
            DateShape::MonthDaySlash => {
                let month: u32 = caps.get(1)?.as_str().parse().ok()?;
                let day: u32 = caps.get(2)?.as_str().parse().ok()?;
                let year = expand_year(caps.get(3)?.as_str())?;
                NaiveDate::from_ymd_opt(year, month, day)?
            }
            DateShape::YearMonthDay => {
                let year: i32 = caps.get(1)?.as_str().parse().ok()?;
                let month: u32 = caps.get(2)?.as_str().parse().ok()?;
                let day: u32 = caps.get(3)?.as_str().parse().ok()?;
                NaiveDate::from_ymd_opt(year, month, day)?
            }
        };

        if date.year() < 1900 || date.year() > self.max_year {
            tracing::debug!(date = %date, "Discarding implausible date");
            return None;
        }
        Some(date)
    }
}

/// Window of text after a label match, clamped to a char boundary.
fn window_after(text: &str, start: usize) -> &str {
    let mut end = (start + LABEL_WINDOW_BYTES).min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[start..end]
}

fn month_number(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?.to_lowercase();
    match prefix.as_str() {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}

/// Two-digit years pivot at 50: "23" → 2023, "87" → 1987.
fn expand_year(raw: &str) -> Option<i32> {
    match raw.len() {
        4 => raw.parse().ok(),
        2 => {
            let n: i32 = raw.parse().ok()?;
            Some(if n < 50 { 2000 + n } else { 1900 + n })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> BTreeMap<String, String> {
        DateExtractor::new().extract(text)
    }

    #[test]
    fn labeled_invoice_and_due_dates() {
        let dates = extract("Invoice Date: January 15, 2023\nDue Date: 02/28/2023");
        assert_eq!(dates.get("invoice_date").map(String::as_str), Some("2023-01-15"));
        assert_eq!(dates.get("due_date").map(String::as_str), Some("2023-02-28"));
        // Both values are already labeled; no synthetic keys remain.
        assert_eq!(dates.len(), 2);
    }

    #[test]
    fn month_year_anchors_to_first_of_month() {
        let dates = extract("Statement period: February 2025");
        assert!(dates.values().any(|v| v == "2025-02-01"));
    }

    #[test]
    fn iso_dates_are_recognized() {
        let dates = extract("Recorded 2023-06-07 by the clerk");
        assert_eq!(dates.get("doc_date_1").map(String::as_str), Some("2023-06-07"));
    }

    #[test]
    fn unlabeled_dates_numbered_in_document_order() {
        let dates = extract("First seen 03/01/2022, again on 04/02/2022.");
        assert_eq!(dates.get("doc_date_1").map(String::as_str), Some("2022-03-01"));
        assert_eq!(dates.get("doc_date_2").map(String::as_str), Some("2022-04-02"));
    }

    #[test]
    fn duplicate_values_are_not_repeated() {
        let dates = extract("Due Date: 01/05/2024. Reminder: payment due 01/05/2024.");
        assert_eq!(dates.get("due_date").map(String::as_str), Some("2024-01-05"));
        assert!(!dates.keys().any(|k| k.starts_with("doc_date")));
    }

    #[test]
    fn implausible_years_are_discarded() {
        let dates = extract("Archived 01/01/1850 and predicted for 01/01/2150");
        assert!(dates.is_empty());
    }

    #[test]
    fn all_results_within_plausible_range() {
        let text = "Dates: 1/1/1899, 12/31/1900, 2024-05-05, June 3000, 07/04/76";
        for value in extract(text).values() {
            let year: i32 = value[..4].parse().unwrap();
            assert!((1900..=Utc::now().year() + 1).contains(&year), "{value}");
        }
    }

    #[test]
    fn two_digit_years_pivot() {
        let dates = extract("Signed 03/15/23 and archived 06/01/87");
        let values: Vec<_> = dates.values().cloned().collect();
        assert!(values.contains(&"2023-03-15".to_string()));
        assert!(values.contains(&"1987-06-01".to_string()));
    }

    #[test]
    fn invalid_calendar_dates_rejected() {
        let dates = extract("Broken: 02/30/2023 and 13/13/2023");
        assert!(dates.is_empty());
    }

    #[test]
    fn letter_dated_label() {
        let dates = extract("This letter, dated March 3, 2021, confirms receipt.");
        assert_eq!(dates.get("letter_date").map(String::as_str), Some("2021-03-03"));
    }

    #[test]
    fn label_without_nearby_date_is_omitted() {
        let dates = extract("Due date to be announced later.");
        assert!(dates.get("due_date").is_none());
    }

    #[test]
    fn deterministic_across_calls() {
        let extractor = DateExtractor::new();
        let text = "Invoice Date: May 5, 2022. Also 06/06/2022 and 2022-07-07.";
        assert_eq!(extractor.extract(text), extractor.extract(text));
    }

    #[test]
    fn ordinal_days_parse() {
        let dates = extract("Exam date: March 3rd, 2024");
        assert_eq!(dates.get("exam_date").map(String::as_str), Some("2024-03-03"));
    }

    #[test]
    fn window_clamps_to_char_boundary() {
        // Multi-byte char straddling the 100-byte window edge must not panic.
        let text = format!("due date: {}é 01/02/2023", "x".repeat(97));
        let _ = extract(&text);
    }
}
