use std::sync::Arc;

use clap::ValueEnum;

use crate::agents::{Agent, AgentBuilder, ToolAgent};
use crate::config::PromptCatalog;
use crate::error::{AgentError, RegistryError};
use crate::tools::{
    ColumnInfoTool, CreateFileTool, CreateFolderTool, Database, IsPrimeTool, LoadCsvTool,
    SavePlotTool, SqlEngineTool, ToolRegistry, VisitWebpageTool, WriteFindingsTool,
};

/// Modules the code agent's generated code may import
pub const CODE_AGENT_IMPORTS: &[&str] = &[
    "pandas",
    "statsmodels",
    "sklearn",
    "numpy",
    "json",
    "matplotlib",
    "os",
    "selenium",
    "requests",
    "markdownify",
    "selenium.webdriver.common.by",
    "selenium.webdriver.common.keys",
    "yfinance",
    "subprocess",
    "bs4",
];

/// Register every tool, sharing one database handle and one HTTP client.
pub fn standard_registry(
    database: Arc<Database>,
    client: reqwest::Client,
) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    registry.register(VisitWebpageTool::new(client))?;
    registry.register(CreateFileTool::new())?;
    registry.register(CreateFolderTool::new())?;
    registry.register(WriteFindingsTool::new())?;
    registry.register(IsPrimeTool::new())?;
    registry.register(LoadCsvTool::new())?;
    registry.register(SavePlotTool::new())?;
    registry.register(SqlEngineTool::new(database.clone()))?;
    registry.register(ColumnInfoTool::new(database))?;
    Ok(registry)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AgentRole {
    Web,
    Code,
    Database,
    Manager,
}

impl AgentRole {
    pub fn agent_name(self) -> &'static str {
        match self {
            AgentRole::Web => "web_agent",
            AgentRole::Code => "code_agent",
            AgentRole::Database => "database_agent",
            AgentRole::Manager => "manager_agent",
        }
    }
}

/// The four standard agents
pub struct Crew {
    web: Arc<ToolAgent>,
    code: Arc<ToolAgent>,
    database: Arc<ToolAgent>,
    manager: Arc<ToolAgent>,
}

impl Crew {
    pub fn standard(
        registry: &ToolRegistry,
        prompts: &PromptCatalog,
        max_iterations: usize,
    ) -> Result<Self, AgentError> {
        let web = configured(
            AgentRole::Web,
            "This agent can browse the web and provide the results.",
            prompts,
            max_iterations,
        )
        .tools(registry, &["visit_webpage"])?
        .build()?;

        let code = configured(
            AgentRole::Code,
            "This agent can run code snippets and provide the output.",
            prompts,
            max_iterations,
        )
        .tools(
            registry,
            &[
                "write_findings_to_text_file",
                "create_file_if_not_exists",
                "create_folder_if_not_exists",
                "is_prime",
                "load_csv_from_path",
                "save_plot_to_file",
            ],
        )?
        .authorized_imports(CODE_AGENT_IMPORTS.iter().copied())
        .build()?;

        let database = configured(
            AgentRole::Database,
            "This agent can query a database and provide the results.",
            prompts,
            max_iterations,
        )
        .tools(registry, &["sql_engine", "get_database_column_info"])?
        .build()?;

        let web = Arc::new(web);
        let code = Arc::new(code);
        let database = Arc::new(database);

        let manager = configured(
            AgentRole::Manager,
            "This agent breaks a task down and hands the parts to its team.",
            prompts,
            max_iterations,
        )
        .delegate(web.clone())
        .delegate(code.clone())
        .delegate(database.clone())
        .build()?;

        Ok(Self {
            web,
            code,
            database,
            manager: Arc::new(manager),
        })
    }

    pub fn agent(&self, role: AgentRole) -> Arc<ToolAgent> {
        match role {
            AgentRole::Web => self.web.clone(),
            AgentRole::Code => self.code.clone(),
            AgentRole::Database => self.database.clone(),
            AgentRole::Manager => self.manager.clone(),
        }
    }

    pub fn agents(&self) -> [&dyn Agent; 4] {
        [
            self.web.as_ref(),
            self.code.as_ref(),
            self.database.as_ref(),
            self.manager.as_ref(),
        ]
    }
}

fn configured(
    role: AgentRole,
    description: &str,
    prompts: &PromptCatalog,
    max_iterations: usize,
) -> AgentBuilder {
    let name = role.agent_name();
    let mut builder = AgentBuilder::new(name)
        .description(description)
        .max_iterations(max_iterations);

    if let Some(entry) = prompts.get(name) {
        if let Some(description) = &entry.description {
            builder = builder.description(description.clone());
        }
        if let Some(prompt) = &entry.prompt {
            builder = builder.system_prompt(prompt.clone());
        }
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crew(prompts: &PromptCatalog) -> Crew {
        let database = Arc::new(Database::new("unused.db"));
        let registry = standard_registry(database, reqwest::Client::new()).unwrap();
        Crew::standard(&registry, prompts, 20).unwrap()
    }

    #[test]
    fn registry_holds_all_tools() {
        let registry =
            standard_registry(Arc::new(Database::new("unused.db")), reqwest::Client::new())
                .unwrap();
        assert_eq!(
            registry.names(),
            vec![
                "create_file_if_not_exists",
                "create_folder_if_not_exists",
                "get_database_column_info",
                "is_prime",
                "load_csv_from_path",
                "save_plot_to_file",
                "sql_engine",
                "visit_webpage",
                "write_findings_to_text_file",
            ]
        );
    }

    #[test]
    fn agents_get_their_tool_sets() {
        let crew = crew(&PromptCatalog::default());
        assert_eq!(crew.agent(AgentRole::Web).tools().names(), vec!["visit_webpage"]);
        assert_eq!(
            crew.agent(AgentRole::Database).tools().names(),
            vec!["get_database_column_info", "sql_engine"]
        );
        assert_eq!(crew.agent(AgentRole::Code).tools().len(), 6);

        let manager = crew.agent(AgentRole::Manager);
        assert!(manager.tools().is_empty());
        let delegates: Vec<&str> = manager.delegates().iter().map(|d| d.name()).collect();
        assert_eq!(delegates, vec!["web_agent", "code_agent", "database_agent"]);
    }

    #[test]
    fn only_code_agent_has_imports() {
        let crew = crew(&PromptCatalog::default());
        let code = crew.agent(AgentRole::Code);
        assert!(code.is_import_authorized("selenium.webdriver.common.keys"));
        assert!(code.is_import_authorized("bs4"));
        assert!(!code.is_import_authorized("selenium.webdriver.chrome"));
        assert!(crew.agent(AgentRole::Web).authorized_imports().is_empty());
    }

    #[test]
    fn catalog_overrides_description_and_prompt() {
        let prompts = PromptCatalog::from_json_str(
            r#"[{"type": "web_agent", "description": "Reads pages.", "prompt": "{{name}} reads."}]"#,
        )
        .unwrap();
        let crew = crew(&prompts);
        let web = crew.agent(AgentRole::Web);
        assert_eq!(web.description(), "Reads pages.");
        assert_eq!(web.system_prompt(), "web_agent reads.");
        assert!(
            crew.agent(AgentRole::Manager)
                .system_prompt()
                .contains("- web_agent: Reads pages.")
        );
    }
}
