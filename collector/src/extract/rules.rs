//! Built-in rule table for trust certification research.

use super::FieldRule;

/// `(field, pattern)` pairs. Gaps between words never cross a sentence end
/// or a line break.
const RULES: &[(&str, &str)] = &[
    ("requirements", r"required[^.\n]*?fields?"),
    ("requirements", r"must[^.\n]*?include"),
    ("requirements", r"necessary[^.\n]*?information"),
    ("requirements", r"required[^.\n]*?information"),
    ("form_fields", r"trust[^.\n]*?name"),
    ("form_fields", r"grantor[^.\n]*?name"),
    ("form_fields", r"trustee[^.\n]*?name"),
    ("form_fields", r"date[^.\n]*?trust"),
    ("form_fields", r"tax[^.\n]*?identification"),
    ("form_fields", r"powers[^.\n]*?trustee"),
    ("form_fields", r"revocability"),
    ("form_fields", r"governing[^.\n]*?law"),
    ("legal_requirements", r"shall[^.\n]*?include"),
    ("legal_requirements", r"must[^.\n]*?contain"),
    ("legal_requirements", r"required[^.\n]*?to[^.\n]*?include"),
    ("legal_requirements", r"certification[^.\n]*?shall"),
    ("legal_requirements", r"statute[^.\n]*?requires"),
    ("best_practices", r"best[^.\n]*?practices?"),
    ("best_practices", r"recommended[^.\n]*?to"),
    ("best_practices", r"should[^.\n]*?include"),
    ("best_practices", r"ensure[^.\n]*?that"),
    ("common_errors", r"common[^.\n]*?errors?"),
    ("common_errors", r"avoid[^.\n]*?mistakes?"),
    ("common_errors", r"typical[^.\n]*?problems?"),
    ("common_errors", r"incorrect[^.\n]*?information"),
    ("esignature", r"electronic[^.\n]*?signature"),
    ("esignature", r"digital[^.\n]*?signature"),
    ("esignature", r"(?:online|remote)[^.\n]*?notarization"),
];

/// The default rule table.
#[must_use]
pub fn default_rules() -> Vec<FieldRule> {
    RULES
        .iter()
        .map(|(field, pattern)| FieldRule::new(*field, *pattern))
        .collect()
}
