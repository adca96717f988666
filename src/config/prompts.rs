use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Description and system prompt override for one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptEntry {
    #[serde(alias = "type")]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub prompt: Option<String>,
}

/// Per-agent prompt overrides loaded from a JSON array
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptCatalog {
    entries: Vec<PromptEntry>,
}

impl PromptCatalog {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "loading prompt catalog");
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw)
            .map(|entries| Self { entries })
            .map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw)
            .map(|entries| Self { entries })
            .map_err(|e| ConfigError::Parse {
                path: "<inline>".to_string(),
                message: e.to_string(),
            })
    }

    /// Entry for `name`; the last one wins when a name repeats
    pub fn get(&self, name: &str) -> Option<&PromptEntry> {
        self.entries.iter().rev().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_type_as_name() {
        let catalog = PromptCatalog::from_json_str(
            r#"[
                {"type": "code_agent", "description": "Writes code.", "prompt": "You are {{name}}."},
                {"name": "web_agent", "description": "Browses."}
            ]"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        let code = catalog.get("code_agent").unwrap();
        assert_eq!(code.prompt.as_deref(), Some("You are {{name}}."));
        assert_eq!(catalog.get("web_agent").unwrap().prompt, None);
        assert!(catalog.get("database_agent").is_none());
    }

    #[test]
    fn later_entries_win() {
        let catalog = PromptCatalog::from_json_str(
            r#"[{"name": "a", "description": "first"}, {"name": "a", "description": "second"}]"#,
        )
        .unwrap();
        assert_eq!(
            catalog.get("a").unwrap().description.as_deref(),
            Some("second")
        );
    }

    #[test]
    fn rejects_non_array() {
        assert!(matches!(
            PromptCatalog::from_json_str(r#"{"name": "a"}"#),
            Err(ConfigError::Parse { .. })
        ));
    }
}
