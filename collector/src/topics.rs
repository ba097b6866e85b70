//! Topics and the sources that supply them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::SetupError;

/// One subject of research: a state, an institution, a free-text theme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Creates a topic, trimming surrounding whitespace.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_string())
    }

    /// The topic text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Topic {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Topic {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Built-in topic lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// The fifty US states plus the District of Columbia.
    States,
    /// Large US financial institutions.
    Institutions,
}

impl Preset {
    /// Parses a preset name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "states" => Some(Self::States),
            "institutions" => Some(Self::Institutions),
            _ => None,
        }
    }

    /// The topic names in this preset.
    #[must_use]
    pub fn names(self) -> &'static [&'static str] {
        match self {
            Self::States => US_STATES,
            Self::Institutions => INSTITUTIONS,
        }
    }
}

const US_STATES: &[&str] = &[
    "Alabama", "Alaska", "Arizona", "Arkansas", "California", "Colorado",
    "Connecticut", "Delaware", "District of Columbia", "Florida", "Georgia",
    "Hawaii", "Idaho", "Illinois", "Indiana", "Iowa", "Kansas", "Kentucky",
    "Louisiana", "Maine", "Maryland", "Massachusetts", "Michigan", "Minnesota",
    "Mississippi", "Missouri", "Montana", "Nebraska", "Nevada", "New Hampshire",
    "New Jersey", "New Mexico", "New York", "North Carolina", "North Dakota",
    "Ohio", "Oklahoma", "Oregon", "Pennsylvania", "Rhode Island",
    "South Carolina", "South Dakota", "Tennessee", "Texas", "Utah", "Vermont",
    "Virginia", "Washington", "West Virginia", "Wisconsin", "Wyoming",
];

const INSTITUTIONS: &[&str] = &[
    "Chase Bank",
    "Bank of America",
    "Wells Fargo",
    "Fidelity Investments",
    "Vanguard",
    "Charles Schwab",
    "Morgan Stanley",
    "Goldman Sachs",
    "JP Morgan",
    "Citibank",
];

/// Supplies the list of topics for a run.
#[derive(Debug, Clone)]
pub enum TopicSource {
    /// Topics given inline.
    Inline(Vec<String>),
    /// A file with one topic per line, or a JSON array for `.json` files.
    File(PathBuf),
    /// A built-in list.
    Preset(Preset),
}

impl TopicSource {
    /// Loads the topics. Blank entries are dropped and duplicates collapse to
    /// their first occurrence.
    pub fn load(&self) -> Result<Vec<Topic>, SetupError> {
        let raw: Vec<String> = match self {
            Self::Inline(names) => names.clone(),
            Self::Preset(preset) => preset.names().iter().map(|s| (*s).to_string()).collect(),
            Self::File(path) => read_topic_file(path)?,
        };
        Ok(normalize(raw))
    }
}

fn read_topic_file(path: &Path) -> Result<Vec<String>, SetupError> {
    let source_err = |message: String| SetupError::TopicSource {
        path: path.display().to_string(),
        message,
    };
    let text = std::fs::read_to_string(path).map_err(|e| source_err(e.to_string()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        return serde_json::from_str(&text).map_err(|e| source_err(e.to_string()));
    }

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .map(String::from)
        .collect())
}

fn normalize(raw: Vec<String>) -> Vec<Topic> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(Topic::new)
        .filter(|t| !t.as_str().is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_topic_trims() {
        let topic = Topic::new("  Arizona \n");
        assert_eq!(topic.as_str(), "Arizona");
        assert_eq!(topic.to_string(), "Arizona");
    }

    #[test]
    fn test_inline_dedup_and_blank() {
        let source = TopicSource::Inline(vec![
            "Texas".to_string(),
            " ".to_string(),
            "Ohio".to_string(),
            "Texas ".to_string(),
        ]);
        let topics = source.load().unwrap();
        assert_eq!(topics, vec![Topic::from("Texas"), Topic::from("Ohio")]);
    }

    #[test]
    fn test_presets() {
        let states = TopicSource::Preset(Preset::States).load().unwrap();
        assert_eq!(states.len(), 51);
        assert!(states.contains(&Topic::from("District of Columbia")));

        let institutions = TopicSource::Preset(Preset::Institutions).load().unwrap();
        assert_eq!(institutions.len(), 10);

        assert_eq!(Preset::from_name("STATES"), Some(Preset::States));
        assert_eq!(Preset::from_name("planets"), None);
    }

    #[test]
    fn test_text_file_with_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topics.txt");
        std::fs::write(&path, "# states to revisit\nArizona\n\nNevada\n").unwrap();

        let topics = TopicSource::File(path).load().unwrap();
        assert_eq!(topics, vec![Topic::from("Arizona"), Topic::from("Nevada")]);
    }

    #[test]
    fn test_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topics.json");
        std::fs::write(&path, r#"["Vanguard", "Citibank"]"#).unwrap();

        let topics = TopicSource::File(path).load().unwrap();
        assert_eq!(topics, vec![Topic::from("Vanguard"), Topic::from("Citibank")]);
    }

    #[test]
    fn test_missing_file_is_setup_error() {
        let err = TopicSource::File(PathBuf::from("/nonexistent/topics.txt"))
            .load()
            .unwrap_err();
        assert!(matches!(err, SetupError::TopicSource { .. }));
    }

    #[test]
    fn test_empty_inline_list() {
        let topics = TopicSource::Inline(Vec::new()).load().unwrap();
        assert!(topics.is_empty());
    }
}
