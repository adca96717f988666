mod prompts;
mod settings;

pub use prompts::{PromptCatalog, PromptEntry};
pub use settings::{DEFAULT_CONFIG_FILE, Settings};
