//! Expansion of topics into search queries.

use crate::topics::Topic;

/// Placeholder replaced by the topic text.
pub const TOPIC_PLACEHOLDER: &str = "{topic}";

/// Expands a topic into an ordered fallback chain of queries.
///
/// Callers try the queries in order and stop at the first one that returns
/// at least one hit.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    templates: Vec<String>,
}

impl QueryBuilder {
    /// Creates a builder. Templates without a `{topic}` placeholder get the
    /// topic prepended so every query stays topic-specific.
    #[must_use]
    pub fn new(templates: Vec<String>) -> Self {
        let templates = templates
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(|t| {
                if t.contains(TOPIC_PLACEHOLDER) {
                    t
                } else {
                    format!("{TOPIC_PLACEHOLDER} {t}")
                }
            })
            .collect();
        Self { templates }
    }

    /// The normalized templates.
    #[must_use]
    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    /// Builds the queries for a topic; never empty.
    #[must_use]
    pub fn build_queries(&self, topic: &Topic) -> Vec<String> {
        if self.templates.is_empty() {
            return vec![topic.as_str().to_string()];
        }

        let mut queries: Vec<String> = Vec::with_capacity(self.templates.len());
        for template in &self.templates {
            let query = template.replace(TOPIC_PLACEHOLDER, topic.as_str());
            if !queries.contains(&query) {
                queries.push(query);
            }
        }
        queries
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(crate::config::default_query_templates())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_chain() {
        let builder = QueryBuilder::default();
        let queries = builder.build_queries(&Topic::from("Arizona"));
        assert_eq!(
            queries,
            vec![
                "Arizona trust certification requirements".to_string(),
                "Arizona certification of trust statute".to_string(),
                "Arizona uniform trust code".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_templates_fall_back_to_topic() {
        let builder = QueryBuilder::new(vec![" ".to_string()]);
        assert!(builder.templates().is_empty());
        assert_eq!(builder.build_queries(&Topic::from("Ohio")), vec!["Ohio".to_string()]);
    }

    #[test]
    fn test_template_without_placeholder() {
        let builder = QueryBuilder::new(vec!["statute".to_string()]);
        assert_eq!(builder.templates(), ["{topic} statute".to_string()]);
        assert_eq!(builder.build_queries(&Topic::from("Utah")), vec!["Utah statute".to_string()]);
    }

    #[test]
    fn test_duplicate_queries_collapse() {
        let builder = QueryBuilder::new(vec![
            "{topic} form".to_string(),
            "{topic} form".to_string(),
            "form for {topic}".to_string(),
        ]);
        assert_eq!(
            builder.build_queries(&Topic::from("Iowa")),
            vec!["Iowa form".to_string(), "form for Iowa".to_string()]
        );
    }
}
