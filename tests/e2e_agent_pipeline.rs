mod common;

use agent_tools::{
    Agent, AgentError, AgentRole, Crew, Executor, LlmResponse, MessageRole, PromptCatalog,
    TaskRun, TaskState,
};
use serde_json::json;
use tempfile::TempDir;

use common::{MockLlmProvider, create_test_tool_registry, tool_call};

fn standard_crew(dir: &TempDir) -> Crew {
    let registry = create_test_tool_registry(&dir.path().join("test.db"));
    Crew::standard(&registry, &PromptCatalog::default(), 20).expect("standard crew")
}

#[tokio::test]
async fn test_code_agent_checks_prime_and_writes_findings() {
    let dir = TempDir::new().expect("create temp dir");
    let out = dir.path().join("findings").join("out.txt");
    let crew = standard_crew(&dir);

    let provider = MockLlmProvider::with_responses(vec![
        tool_call("call_1", "is_prime", json!({ "n": 17 })),
        tool_call(
            "call_2",
            "write_findings_to_text_file",
            json!({ "findings": "17 is prime!", "path": out.to_string_lossy() }),
        ),
        LlmResponse::answer("Great news: 17 is a prime number!"),
    ]);

    let agent = crew.agent(AgentRole::Code);
    let answer = agent
        .run("Check if 17 is prime and save the result", &provider)
        .await
        .expect("agent should complete");

    assert!(answer.contains("17"));
    let written = std::fs::read_to_string(&out).expect("findings file written");
    assert!(written.contains("prime"));
    assert!(written.contains("17"));

    let calls = provider.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[0].system.contains("You are code_agent"));
    assert!(calls[0].tools.contains(&"is_prime".to_string()));

    let result = calls[1]
        .messages
        .iter()
        .find(|m| m.role == MessageRole::Tool)
        .and_then(|m| m.tool_result.as_ref())
        .expect("tool result fed back");
    assert_eq!(result.tool_call_id, "call_1");
    assert_eq!(result.result, "true");
    assert!(!result.is_error);
}

#[tokio::test]
async fn test_unknown_tool_is_reported_back_to_the_model() {
    let dir = TempDir::new().expect("create temp dir");
    let crew = standard_crew(&dir);

    let provider = MockLlmProvider::with_responses(vec![
        tool_call("call_1", "nonexistent_tool", json!({})),
        LlmResponse::answer("That tool wasn't available, but task is done."),
    ]);

    let answer = crew
        .agent(AgentRole::Web)
        .run("do something", &provider)
        .await
        .expect("agent should recover");
    assert!(answer.contains("task is done"));

    let calls = provider.calls();
    let result = calls[1]
        .messages
        .last()
        .and_then(|m| m.tool_result.as_ref())
        .expect("tool result fed back");
    assert!(result.is_error);
    assert!(result.result.starts_with("Error:"));
    assert!(result.result.contains("nonexistent_tool"));
}

#[tokio::test]
async fn test_invalid_arguments_are_reported_back_to_the_model() {
    let dir = TempDir::new().expect("create temp dir");
    let crew = standard_crew(&dir);

    let provider = MockLlmProvider::with_responses(vec![
        tool_call("call_1", "is_prime", json!({ "n": "seventeen" })),
        LlmResponse::answer("I could not check it."),
    ]);

    crew.agent(AgentRole::Code)
        .run("is seventeen prime?", &provider)
        .await
        .expect("agent should recover");

    let calls = provider.calls();
    let result = calls[1]
        .messages
        .last()
        .and_then(|m| m.tool_result.as_ref())
        .expect("tool result fed back");
    assert!(result.is_error);
    assert!(result.result.contains("is_prime"));
}

#[tokio::test]
async fn test_database_agent_describes_columns() {
    let dir = TempDir::new().expect("create temp dir");
    let db_path = dir.path().join("test.db");
    {
        let conn = rusqlite::Connection::open(&db_path).expect("open db");
        conn.execute("CREATE TABLE users (name TEXT, phone INTEGER)", [])
            .expect("create table");
    }
    let crew = standard_crew(&dir);

    let provider = MockLlmProvider::with_responses(vec![
        tool_call(
            "call_1",
            "get_database_column_info",
            json!({ "table_name": "users" }),
        ),
        LlmResponse::answer("users has name and phone"),
    ]);

    crew.agent(AgentRole::Database)
        .run("Get the column information of the table 'users'", &provider)
        .await
        .expect("agent should complete");

    let calls = provider.calls();
    let result = calls[1]
        .messages
        .last()
        .and_then(|m| m.tool_result.as_ref())
        .expect("tool result fed back");
    assert_eq!(result.result, "name: TEXT\nphone: INTEGER");
}

#[tokio::test]
async fn test_manager_delegates_to_code_agent() {
    let dir = TempDir::new().expect("create temp dir");
    let crew = standard_crew(&dir);

    let provider = MockLlmProvider::with_responses(vec![
        // manager hands the task to the code agent
        tool_call(
            "call_1",
            "code_agent",
            json!({ "task": "Check whether 17 is prime" }),
        ),
        // code agent
        tool_call("call_2", "is_prime", json!({ "n": 17 })),
        LlmResponse::answer("17 is prime"),
        // manager again
        LlmResponse::answer("The code agent reports that 17 is prime."),
    ]);

    let answer = crew
        .agent(AgentRole::Manager)
        .run("Is 17 prime?", &provider)
        .await
        .expect("manager should complete");
    assert_eq!(answer, "The code agent reports that 17 is prime.");

    let calls = provider.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(
        calls[0].tools,
        vec!["web_agent", "code_agent", "database_agent"]
    );
    assert!(calls[1].system.contains("You are code_agent"));
    assert_eq!(
        calls[1].messages[0].content,
        "Check whether 17 is prime"
    );

    let delegated = calls[3]
        .messages
        .last()
        .and_then(|m| m.tool_result.as_ref())
        .expect("delegate answer fed back");
    assert_eq!(delegated.name, "code_agent");
    assert_eq!(delegated.result, "17 is prime");
    assert!(!delegated.is_error);
}

#[tokio::test]
async fn test_agent_fails_after_max_iterations() {
    let dir = TempDir::new().expect("create temp dir");
    let registry = create_test_tool_registry(&dir.path().join("test.db"));
    let crew = Crew::standard(&registry, &PromptCatalog::default(), 2).expect("crew");

    let provider = MockLlmProvider::with_responses(vec![
        tool_call("call_1", "is_prime", json!({ "n": 2 })),
        tool_call("call_2", "is_prime", json!({ "n": 3 })),
        tool_call("call_3", "is_prime", json!({ "n": 5 })),
    ]);

    let err = crew
        .agent(AgentRole::Code)
        .run("keep going", &provider)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AgentError::MaxIterations { iterations: 2, .. }
    ));
    assert_eq!(provider.calls().len(), 2);
}

#[tokio::test]
async fn test_executor_tracks_task_run() {
    let dir = TempDir::new().expect("create temp dir");
    let crew = standard_crew(&dir);
    let executor = Executor::new(MockLlmProvider::single_response("Nothing to do."));

    let agent = crew.agent(AgentRole::Web);
    let mut run = TaskRun::new(agent.name(), "say hello");
    let output = executor
        .run_tracked(agent.as_ref(), &mut run)
        .await
        .expect("run should complete");

    assert_eq!(output, "Nothing to do.");
    assert_eq!(run.state, TaskState::Completed("Nothing to do.".to_string()));
    assert!(run.finished_at.is_some());
}
