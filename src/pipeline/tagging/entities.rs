//! Issuer and recipient extraction.
//!
//! Issuer identification is layered: the known-issuer table wins outright,
//! then explicit header labels, then company-suffix phrases, then the first
//! line of the document as a last resort. A miss is a `None`, never an
//! error — plenty of documents simply don't say who sent them.

use regex::Regex;

use crate::config::KnownIssuer;

/// How many of the leading non-blank lines count as the "header".
const HEADER_LINES: usize = 7;

struct CompiledIssuer {
    canonical: String,
    aliases_lower: Vec<String>,
}

pub struct EntityExtractor {
    known_issuers: Vec<CompiledIssuer>,
    header_label_re: Regex,
    company_suffix_re: Regex,
    recipient_patterns: Vec<Regex>,
    metadata_patterns: Vec<Regex>,
    phone_re: Regex,
    street_re: Regex,
    zip_re: Regex,
}

impl EntityExtractor {
    pub fn new(known_issuers: &[KnownIssuer]) -> Self {
        let known_issuers = known_issuers
            .iter()
            .map(|ki| CompiledIssuer {
                canonical: ki.canonical.clone(),
                aliases_lower: ki.aliases.iter().map(|a| a.to_lowercase()).collect(),
            })
            .collect();

        let metadata = [
            r"(?i)^(?:to|from|date|re|subject|attn|attention|cc|sender|issued\s+by)\s*:",
            r"(?i)^(?:invoice|receipt|statement|account|order|ref(?:erence)?|doc(?:ument)?)\s*(?:#|no\.?|num(?:ber)?)",
            r"(?i)^page\s+\d+",
            r"^\s*\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\s*$",
            r"^\s*\d{4}-\d{1,2}-\d{1,2}\s*$",
        ];

        Self {
            known_issuers,
            header_label_re: Regex::new(r"(?i)^(?:from|sender|issued\s+by)\s*:\s*(.+)$").unwrap(),
            company_suffix_re: Regex::new(
                r"([A-Z][A-Za-z0-9&.,'\- ]*?(?:Inc\.?|LLC|Ltd\.?|Corp\.?|Corporation|Company|Co\.|Hospital|Clinic|Medical Center|Associates|Group|Laboratories|Labs|Insurance|Bank|University))",
            )
            .unwrap(),
            recipient_patterns: vec![
                Regex::new(
                    r"(?i:to|attention|attn|bill\s+to|deliver\s+to)\s*:\s*([A-Z][A-Za-z0-9&.,'\- ]+)",
                )
                .unwrap(),
                Regex::new(r"(?i:dear)\s+([^,\n:]+)[,:]").unwrap(),
                Regex::new(
                    r"(?i:patient\s+name|name\s+of\s+patient|patient)\s*:\s*([A-Z][A-Za-z0-9&.,'\- ]+)",
                )
                .unwrap(),
            ],
            metadata_patterns: metadata.iter().map(|p| Regex::new(p).unwrap()).collect(),
            phone_re: Regex::new(r"\(?\d{3}\)?[\s.-]?\d{3}[\s.-]\d{4}").unwrap(),
            street_re: Regex::new(
                r"(?i)\d+\s+[A-Za-z0-9.' ]+\b(?:street|st|avenue|ave|road|rd|boulevard|blvd|drive|dr|lane|ln|way|suite|ste)\b\.?",
            )
            .unwrap(),
            zip_re: Regex::new(r"\b\d{5}(?:-\d{4})?\b").unwrap(),
        }
    }

    /// Best guess at who issued the document, or `None`.
    pub fn extract_issuer(&self, text: &str) -> Option<String> {
        // Pass 1: known-issuer table beats everything.
        let lower = text.to_lowercase();
        for issuer in &self.known_issuers {
            if issuer.aliases_lower.iter().any(|a| lower.contains(a)) {
                tracing::debug!(issuer = %issuer.canonical, "Known issuer alias matched");
                return Some(issuer.canonical.clone());
            }
        }

        let header: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(HEADER_LINES)
            .collect();

        // Pass 2: explicit "From:" style labels in the header.
        for line in &header {
            if let Some(caps) = self.header_label_re.captures(line) {
                let cleaned = self.clean_entity(caps.get(1).map_or("", |m| m.as_str()));
                if cleaned.len() > 3 {
                    return Some(cleaned);
                }
            }
        }

        // Pass 3: capitalized phrase ending in a corporate suffix.
        for line in &header {
            if let Some(caps) = self.company_suffix_re.captures(line) {
                let cleaned = self.clean_entity(caps.get(1).map_or("", |m| m.as_str()));
                if cleaned.len() > 3 {
                    return Some(cleaned);
                }
            }
        }

        // Pass 4: first line, if it looks like letterhead rather than metadata.
        if let Some(first) = header.first() {
            if !self.is_metadata_line(first)
                && first.chars().any(|c| c.is_uppercase())
                && first.chars().any(|c| c.is_alphabetic())
            {
                let cleaned = self.clean_entity(first);
                if cleaned.len() > 3 {
                    return Some(cleaned);
                }
            }
        }

        None
    }

    /// Addressee of the document, or `None`.
    pub fn extract_recipient(&self, text: &str) -> Option<String> {
        for pattern in &self.recipient_patterns {
            if let Some(caps) = pattern.captures(text) {
                let candidate = caps.get(1).map_or("", |m| m.as_str()).trim();
                let candidate = candidate.trim_matches(|c: char| c == ',' || c == '.' || c == ':');
                if candidate.len() > 3 {
                    return Some(candidate.to_string());
                }
            }
        }
        None
    }

    /// Strip the noise that rides along with letterhead lines: trailing
    /// `|`-delimited segments, phone numbers, street addresses, ZIP codes.
    fn clean_entity(&self, raw: &str) -> String {
        let base = raw.split('|').next().unwrap_or(raw);
        let no_phone = self.phone_re.replace_all(base, "");
        let no_street = self.street_re.replace_all(&no_phone, "");
        let no_zip = self.zip_re.replace_all(&no_street, "");
        no_zip
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | ';' | ':' | '-'))
            .to_string()
    }

    /// Lines that carry document metadata rather than letterhead.
    fn is_metadata_line(&self, line: &str) -> bool {
        self.metadata_patterns.iter().any(|p| p.is_match(line))
    }
}
