//! Pattern-driven field extraction.
//!
//! Field rules are data: a table of `(field, pattern)` pairs compiled once
//! into a [`FieldExtractor`]. Several rules may feed the same field. The
//! extractor is total over text input: every configured field appears in the
//! result, possibly with an empty list.

mod rules;

pub use rules::default_rules;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::errors::SetupError;

/// Extracted values keyed by field name.
pub type FieldMap = BTreeMap<String, Vec<String>>;

/// A named pattern used to pull a datum out of raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    /// Field the matches are filed under.
    pub field: String,
    /// Regular expression, matched case-insensitively.
    pub pattern: String,
}

impl FieldRule {
    /// Creates a new rule.
    #[must_use]
    pub fn new(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            pattern: pattern.into(),
        }
    }
}

/// Field name taken by the topic column of the flat outputs.
pub const RESERVED_FIELD: &str = "topic";

#[derive(Debug, Clone)]
struct CompiledRule {
    field: String,
    regex: Regex,
}

/// Applies a compiled rule table to text.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    rules: Vec<CompiledRule>,
    fields: Vec<String>,
}

impl FieldExtractor {
    /// Compiles a rule table. Any invalid pattern, or a rule for the
    /// reserved [`RESERVED_FIELD`] name, is a setup error.
    pub fn new(rules: &[FieldRule]) -> Result<Self, SetupError> {
        let mut compiled = Vec::with_capacity(rules.len());
        let mut fields: Vec<String> = Vec::new();

        for rule in rules {
            if rule.field.eq_ignore_ascii_case(RESERVED_FIELD) {
                return Err(SetupError::InvalidRule {
                    field: rule.field.clone(),
                    pattern: rule.pattern.clone(),
                    message: format!("field name '{RESERVED_FIELD}' is reserved for the topic column"),
                });
            }
            let regex = RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| SetupError::InvalidRule {
                    field: rule.field.clone(),
                    pattern: rule.pattern.clone(),
                    message: e.to_string(),
                })?;
            if !fields.contains(&rule.field) {
                fields.push(rule.field.clone());
            }
            compiled.push(CompiledRule {
                field: rule.field.clone(),
                regex,
            });
        }

        Ok(Self {
            rules: compiled,
            fields,
        })
    }

    /// Field names in first-seen rule order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// A map with every field present and empty.
    #[must_use]
    pub fn empty_fields(&self) -> FieldMap {
        self.fields.iter().map(|f| (f.clone(), Vec::new())).collect()
    }

    /// Extracts every field from `text`.
    ///
    /// When a pattern has a capture group the first group is the value,
    /// otherwise the whole match. Values are trimmed, empty values dropped,
    /// and each field's list is deduplicated in first-match order.
    #[must_use]
    pub fn extract(&self, text: &str) -> FieldMap {
        let mut out = self.empty_fields();
        let mut seen: HashSet<(&str, String)> = HashSet::new();

        for rule in &self.rules {
            for caps in rule.regex.captures_iter(text) {
                let Some(m) = caps.get(1).or_else(|| caps.get(0)) else {
                    continue;
                };
                let value = m.as_str().trim();
                if value.is_empty() {
                    continue;
                }
                if seen.insert((rule.field.as_str(), value.to_string())) {
                    if let Some(values) = out.get_mut(&rule.field) {
                        values.push(value.to_string());
                    }
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extractor(rules: &[(&str, &str)]) -> FieldExtractor {
        let rules: Vec<FieldRule> = rules.iter().map(|(f, p)| FieldRule::new(*f, *p)).collect();
        FieldExtractor::new(&rules).unwrap()
    }

    #[test]
    fn test_case_insensitive_and_deduplicated() {
        let ex = extractor(&[("requirements", r"must include \w+")]);
        let fields = ex.extract("Trustee MUST INCLUDE name. Trustee must include date. Must include name.");

        assert_eq!(
            fields.get("requirements").unwrap(),
            &vec!["MUST INCLUDE name".to_string(), "must include date".to_string()]
        );
    }

    #[test]
    fn test_case_variants_are_distinct_values() {
        let ex = extractor(&[("forms", r"trust form")]);
        let fields = ex.extract("Trust Form and trust form");
        assert_eq!(fields["forms"].len(), 2);
    }

    #[test]
    fn test_total_over_empty_input() {
        let ex = extractor(&[("requirements", r"must"), ("forms", r"form")]);
        let fields = ex.extract("");

        assert_eq!(fields.len(), 2);
        assert!(fields.values().all(Vec::is_empty));
    }

    #[test]
    fn test_capture_group_is_value() {
        let ex = extractor(&[("phone", r"call\s+(\d{3}-\d{3}-\d{4})")]);
        let fields = ex.extract("Please call 800-555-0100 today");
        assert_eq!(fields["phone"], vec!["800-555-0100".to_string()]);
    }

    #[test]
    fn test_multiple_rules_share_field() {
        let ex = extractor(&[("statutes", r"§\s*\d+"), ("statutes", r"ARS \d+-\d+")]);
        let fields = ex.extract("See § 736 and ARS 14-11013; again § 736");
        assert_eq!(fields["statutes"], vec!["§ 736".to_string(), "ARS 14-11013".to_string()]);
        assert_eq!(ex.fields(), &["statutes".to_string()]);
    }

    #[test]
    fn test_invalid_pattern_is_setup_error() {
        let err = FieldExtractor::new(&[FieldRule::new("broken", "(unclosed")]).unwrap_err();
        assert!(matches!(err, SetupError::InvalidRule { ref field, .. } if field == "broken"));
    }

    #[test]
    fn test_dot_does_not_cross_lines() {
        let ex = extractor(&[("requirements", r"required.*field")]);
        let fields = ex.extract("required\nfield");
        assert!(fields["requirements"].is_empty());
    }

    #[test]
    fn test_topic_field_name_is_reserved() {
        let rules = vec![
            FieldRule::new("requirements", "must include"),
            FieldRule::new("Topic", "trust"),
        ];
        let err = FieldExtractor::new(&rules).unwrap_err();
        assert!(matches!(err, SetupError::InvalidRule { ref field, ref message, .. }
            if field == "Topic" && message.contains("reserved")));
    }

    #[test]
    fn test_default_rules_keep_matches_inside_paragraphs() {
        let html = "<p>You must bring ID.</p>\
            <p>Banks vary widely in what they accept.</p>\
            <p>Lorem ipsum dolor sit amet.</p>\
            <p>Forms include a signature block.</p>\
            <p>The certification must include the trustee name.</p>";
        let text = crate::fetch::visible_text(html);
        let fields = FieldExtractor::new(&default_rules()).unwrap().extract(&text);

        assert_eq!(fields["requirements"], vec!["must include".to_string()]);
        for value in fields.values().flatten() {
            assert!(!value.contains('\n'), "{value:?} spans paragraphs");
            assert!(!value.contains("Lorem"), "{value:?} spans paragraphs");
        }
    }

    #[test]
    fn test_default_rules_compile() {
        let ex = FieldExtractor::new(&default_rules()).unwrap();
        assert!(ex.fields().contains(&"requirements".to_string()));
        let fields = ex.extract("The certification shall include the trustee name and must include the date.");
        assert!(!fields["legal_requirements"].is_empty());
    }
}
