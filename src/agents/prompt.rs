/// Used when an agent is built without its own template.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are {{name}}, an assistant that solves tasks by calling tools.

Call a tool whenever it helps; each call returns its result as text. A result
starting with "Error:" means the call failed: read the message, then retry with
corrected arguments, try another tool, or explain the failure in your answer.

Tools you can call:
{{tool_descriptions}}

Team members you can hand a sub-task to (call them like a tool with a "task" argument):
{{managed_agents_descriptions}}

Modules that code you write may import: {{authorized_imports}}

When the task is done, reply with the final answer and no tool calls.
"#;

/// Values substituted into a system prompt template
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    pub name: String,
    pub tool_descriptions: String,
    pub managed_agents_descriptions: String,
    pub authorized_imports: String,
}

/// Replace `{{placeholder}}` markers; unknown markers are left as they are.
pub fn render_template(template: &str, ctx: &PromptContext) -> String {
    template
        .replace("{{name}}", &ctx.name)
        .replace("{{tool_descriptions}}", &ctx.tool_descriptions)
        .replace(
            "{{managed_agents_descriptions}}",
            &ctx.managed_agents_descriptions,
        )
        .replace("{{authorized_imports}}", &ctx.authorized_imports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_known_placeholders() {
        let ctx = PromptContext {
            name: "code_agent".to_string(),
            tool_descriptions: "- is_prime(n: integer) -> boolean".to_string(),
            managed_agents_descriptions: "(none)".to_string(),
            authorized_imports: "json, os".to_string(),
        };
        let prompt = render_template(DEFAULT_SYSTEM_PROMPT, &ctx);
        assert!(prompt.starts_with("You are code_agent,"));
        assert!(prompt.contains("- is_prime(n: integer) -> boolean"));
        assert!(prompt.contains("may import: json, os"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn leaves_unknown_placeholders() {
        let out = render_template("{{name}} {{other}}", &PromptContext::default());
        assert_eq!(out, " {{other}}");
    }
}
