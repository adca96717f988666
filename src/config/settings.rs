use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agents::DEFAULT_MAX_ITERATIONS;
use crate::error::ConfigError;
use crate::llm::Backend;
use crate::tools::Database;

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "agent-tools.toml";

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// LLM provider (google, anthropic, openai)
    pub provider: String,

    /// Model to use; the backend's default when unset
    pub model: Option<String>,

    /// Connection string for the relational data source
    pub database_url: String,

    /// JSON file overriding agent descriptions and prompts
    pub prompt_catalog: Option<PathBuf>,

    /// Iteration bound for every agent run
    pub max_iterations: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: "google".to_string(),
            model: None,
            database_url: "sqlite://agent-tools.db".to_string(),
            prompt_catalog: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from `agent-tools.toml` when it exists,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "loading settings");
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Apply `AGENT_TOOLS_*` and `PROMPT_JSON_FILE` overrides from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = get("AGENT_TOOLS_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = get("AGENT_TOOLS_MODEL") {
            self.model = Some(model);
        }
        if let Some(url) = get("AGENT_TOOLS_DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(catalog) = get("PROMPT_JSON_FILE") {
            self.prompt_catalog = Some(PathBuf::from(catalog));
        }
    }

    pub fn backend(&self) -> Result<Backend, ConfigError> {
        self.provider.parse()
    }

    pub fn database(&self) -> Result<Database, ConfigError> {
        Database::from_url(&self.database_url)
    }
}
