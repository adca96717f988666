use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use agent_tools::{
    Agent, AgentRole, AgentToolsError, BackendProvider, Crew, Executor, PromptCatalog, Settings,
    TaskRun, ToolRegistry, standard_registry,
};

#[derive(Parser)]
#[command(name = "agent-tools", version)]
#[command(about = "Tool-using LLM agents for web, code and database tasks", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// LLM provider to use (google, anthropic, openai)
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Model to use (provider-specific)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Settings file (defaults to ./agent-tools.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task with one agent
    Run {
        /// Agent that receives the task
        #[arg(long, value_enum, default_value = "manager")]
        agent: AgentRole,

        /// The task to perform
        task: String,
    },
    /// List the available tools
    Tools,
    /// Run the three sample tasks
    Demo,
}

const DEMO_TASKS: [(AgentRole, &str); 3] = [
    (
        AgentRole::Code,
        "Check if the number 17 is a prime number and provide the result in cheerful way.",
    ),
    (
        AgentRole::Web,
        "Visit https://en.wikipedia.org/wiki/Artificial_intelligence and summarize the recent developments it describes.",
    ),
    (
        AgentRole::Database,
        "Get the column information of the table 'users'.",
    ),
];

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive("info".parse().expect("valid log directive"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(cli: &Cli) -> Result<Settings, AgentToolsError> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(provider) = &cli.provider {
        settings.provider = provider.clone();
    }
    if let Some(model) = &cli.model {
        settings.model = Some(model.clone());
    }
    Ok(settings)
}

fn build_registry(settings: &Settings) -> Result<ToolRegistry, AgentToolsError> {
    let database = Arc::new(settings.database()?);
    Ok(standard_registry(database, reqwest::Client::new())?)
}

fn build_crew(settings: &Settings, registry: &ToolRegistry) -> Result<Crew, AgentToolsError> {
    let prompts = match &settings.prompt_catalog {
        Some(path) => PromptCatalog::load(path)?,
        None => PromptCatalog::default(),
    };
    let crew = Crew::standard(registry, &prompts, settings.max_iterations)?;
    Ok(crew)
}

fn create_executor(settings: &Settings) -> Result<Executor, AgentToolsError> {
    let backend = settings.backend()?;
    let provider = BackendProvider::new(backend, settings.model.as_deref())?;
    info!(provider = %backend, model = provider.model(), "using provider");
    Ok(Executor::new(provider))
}

async fn run_task(executor: &Executor, agent: &dyn Agent, task: &str) -> bool {
    let mut run = TaskRun::new(agent.name(), task);
    match executor.run_tracked(agent, &mut run).await {
        Ok(output) => {
            println!("\n{}", output);
            true
        }
        Err(e) => {
            error!(run_id = %run.id, error = %e, "task failed");
            false
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = load_settings(&cli).context("failed to load settings")?;
    let registry = build_registry(&settings)?;

    match &cli.command {
        Commands::Tools => {
            for descriptor in registry.descriptors() {
                println!("{}\n", descriptor.render_doc());
            }
        }
        Commands::Run { agent, task } => {
            let executor =
                create_executor(&settings).context("failed to create LLM provider")?;
            let crew = build_crew(&settings, &registry)?;
            let agent = crew.agent(*agent);

            info!(agent = agent.name(), "starting task");
            if !run_task(&executor, agent.as_ref(), task).await {
                std::process::exit(1);
            }
        }
        Commands::Demo => {
            let executor =
                create_executor(&settings).context("failed to create LLM provider")?;
            let crew = build_crew(&settings, &registry)?;

            let mut failed = 0;
            for (role, task) in DEMO_TASKS {
                let agent = crew.agent(role);
                info!(agent = agent.name(), "running sample task");
                if !run_task(&executor, agent.as_ref(), task).await {
                    failed += 1;
                }
            }
            if failed > 0 {
                error!(failed, "sample tasks failed");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
