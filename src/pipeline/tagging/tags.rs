//! Tag assignment from keyword rules.
//!
//! Two rule families feed the tag list: semantic rules keyed on the
//! document type (a lab report gets `lab_results`, an invoice with
//! "past due" gets `overdue`) and the configured predefined tags that
//! apply regardless of type. First occurrence wins on duplicates.

use regex::Regex;

use crate::config::TagDefinition;

struct SemanticRule {
    doc_type: &'static str,
    tag: &'static str,
    pattern: Regex,
}

struct PredefinedTag {
    name: String,
    patterns: Vec<Regex>,
}

pub struct TagExtractor {
    semantic_rules: Vec<SemanticRule>,
    predefined: Vec<PredefinedTag>,
}

impl TagExtractor {
    pub fn new(tag_definitions: &[TagDefinition]) -> Self {
        let rule = |doc_type: &'static str, tag: &'static str, pattern: &str| SemanticRule {
            doc_type,
            tag,
            pattern: Regex::new(&format!("(?i){pattern}")).unwrap(),
        };

        let semantic_rules = vec![
            rule("Medical Record", "lab_results", r"\b(?:lab|laboratory)\s+(?:results?|report)\b"),
            rule("Medical Record", "prescription", r"\b(?:prescription|rx|medication)\b"),
            rule("Medical Record", "diagnosis", r"\bdiagnos(?:is|es|ed)\b"),
            rule("Medical Record", "treatment", r"\btreatment\b"),
            rule("Medical Record", "followup", r"\bfollow[\s-]?up\b"),
            rule("Invoice", "overdue", r"\b(?:overdue|past\s+due)\b"),
            rule("Invoice", "payment_due", r"\b(?:payment\s+due|amount\s+due|balance\s+due)\b"),
            rule("Invoice", "services", r"\bservices?\s+(?:rendered|provided)\b"),
            rule("Invoice", "products", r"\b(?:products?|goods|merchandise)\b"),
            rule("Invoice", "discount", r"\bdiscount\b"),
            rule("Legal Document", "contract", r"\b(?:contract|agreement)\b"),
            rule("Legal Document", "notice", r"\bnotice\b"),
            rule("Legal Document", "court", r"\bcourt\b"),
            rule("Legal Document", "settlement", r"\bsettlement\b"),
            rule("Insurance Document", "claim", r"\bclaim\b"),
            rule("Insurance Document", "policy", r"\bpolicy\b"),
            rule("Insurance Document", "coverage", r"\bcoverage\b"),
        ];

        let predefined = tag_definitions
            .iter()
            .map(|def| PredefinedTag {
                name: def.name.clone(),
                patterns: def
                    .keywords
                    .iter()
                    .map(|kw| {
                        Regex::new(&format!(r"(?i)\b{}\b", regex::escape(kw))).unwrap()
                    })
                    .collect(),
            })
            .collect();

        Self {
            semantic_rules,
            predefined,
        }
    }

    /// Tags for a document, semantic rules first, then predefined ones.
    /// Deterministic order; no duplicates.
    pub fn extract(&self, text: &str, document_type: &str) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();

        for rule in &self.semantic_rules {
            if rule.doc_type == document_type && rule.pattern.is_match(text) {
                push_unique(&mut tags, rule.tag);
            }
        }

        for def in &self.predefined {
            if def.patterns.iter().any(|p| p.is_match(text)) {
                push_unique(&mut tags, &def.name);
            }
        }

        tags
    }
}

fn push_unique(tags: &mut Vec<String>, tag: &str) {
    if !tags.iter().any(|t| t == tag) {
        tags.push(tag.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_tag_definitions;

    fn extractor() -> TagExtractor {
        TagExtractor::new(&default_tag_definitions())
    }

    #[test]
    fn medical_record_semantic_tags() {
        let tags = extractor().extract(
            "Lab results attached. Diagnosis: seasonal allergies. Follow-up in 6 weeks.",
            "Medical Record",
        );
        // The semantic `followup` and the predefined `follow_up` are distinct
        // tag names and both legitimately fire here.
        assert_eq!(tags, vec!["lab_results", "diagnosis", "followup", "follow_up"]);
    }

    #[test]
    fn semantic_rules_gated_on_document_type() {
        let tags = extractor().extract("Lab results attached.", "Invoice");
        assert!(tags.is_empty());
    }

    #[test]
    fn invoice_overdue_and_payment_due() {
        let tags = extractor().extract(
            "This account is past due. Balance due: $410.00",
            "Invoice",
        );
        assert_eq!(tags, vec!["overdue", "payment_due"]);
    }

    #[test]
    fn predefined_tags_apply_to_any_type() {
        let tags = extractor().extract("URGENT: respond by Friday", "Letter");
        assert_eq!(tags, vec!["urgent", "follow_up"]);
    }

    #[test]
    fn keyword_matching_is_word_bounded() {
        // "important" inside "unimportantly" must not fire.
        let tags = extractor().extract("unimportantly phrased", "Letter");
        assert!(tags.is_empty());
    }

    #[test]
    fn keywords_with_regex_metacharacters_are_escaped() {
        let defs = vec![TagDefinition {
            name: "billing".into(),
            keywords: vec!["c++ consulting".into()],
        }];
        let tags = TagExtractor::new(&defs).extract(
            "Line item: C++ consulting (hourly), 4 hours",
            "Invoice",
        );
        assert_eq!(tags, vec!["billing"]);
    }

    #[test]
    fn duplicate_tags_collapse() {
        let tags = extractor().extract("urgent urgent URGENT", "Letter");
        assert_eq!(tags, vec!["urgent"]);
    }

    #[test]
    fn no_matches_yields_empty_list() {
        let tags = extractor().extract("Quiet afternoon, nothing notable.", "Letter");
        assert!(tags.is_empty());
    }
}
