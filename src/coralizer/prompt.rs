//! Generation prompt for the repository wrapper

use crate::templates::{python_literal, render, WRAPPER_EXAMPLE};

/// User turn sent alongside the system prompt
pub const GENERATION_USER_PROMPT: &str = "Generate the Python code for the `coral_wrapper.py` script \
based on the requirements and context provided in the system message.";

/// Sampling temperature for wrapper generation
pub const GENERATION_TEMPERATURE: f32 = 0.1;

/// Inputs embedded into the generation prompt
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub coral_server_url: &'a str,
    pub agent_id: &'a str,
    pub file_tree: &'a str,
    pub code_context: &'a str,
}

/// Example wrapper with the request's defaults filled in
pub fn example_output(coral_server_url: &str, agent_id: &str) -> String {
    let url = python_literal(coral_server_url);
    let agent = python_literal(agent_id);
    render(
        WRAPPER_EXAMPLE,
        &[("coral_server_url", url.as_str()), ("agent_id", agent.as_str())],
    )
}

/// Builds the instructional system prompt
pub fn generation_system_prompt(ctx: &PromptContext<'_>) -> String {
    let example = example_output(ctx.coral_server_url, ctx.agent_id);

    format!(
        r#"
You are an expert Python programmer specializing in multi-agent systems and the CAMEL AI framework.
Your task is to create the content for a Python script named 'coral_wrapper.py'.
This script MUST integrate an existing Python agent codebase (context provided below) with the Coral Protocol via the CAMEL AI MCPToolkit.

**Core Requirements for `coral_wrapper.py`:**
1.  **Imports:** Include the necessary imports (`asyncio`, `os`, `sys`, `camel.agents.ChatAgent`, `camel.models.ModelFactory`, `camel.toolkits.MCPToolkit`, `camel.toolkits.mcp_toolkit.MCPClient`, `camel.types.*`). Also include relevant imports from the original codebase where they can be identified.
2.  **Environment Variables:** The script MUST read `CORAL_SERVER_URL` and `CORAL_AGENT_ID` from environment variables, defaulting to '{coral_url}' and '{agent_id}'. It MUST also read `OPENAI_API_KEY` and exit gracefully when it is missing.
3.  **`create_agent` Function:** Define `async def create_agent(connected_mcp_toolkit, agent_id: str)`.
    *   Get tools with `connected_mcp_toolkit.get_tools()`.
    *   Define a system message for the *runtime* agent that states its `agent_id` and instructs it to use the Coral tools (register, list, send, wait_for_mentions).
    *   Create an OpenAI model with `ModelFactory.create` (platform `ModelPlatformType.OPENAI`, `ModelType.GPT_4O`, API key from the environment, low temperature such as 0.2).
    *   Instantiate and return a `camel.agents.ChatAgent` with the system message, model and tools.
4.  **`main` Function:** Define `async def main()`.
    *   Print status messages (connecting, creating agent, registering, starting loop).
    *   Create the `MCPClient` and `MCPToolkit` and enter `async with mcp_toolkit.connection() as connected_mcp_toolkit:`.
    *   Call `create_agent` inside the `with` block.
    *   **Register the Agent:** call `await camel_agent.astep(f"Register yourself with the agent ID '{{agent_id}}'.")` and handle registration errors.
    *   **Main Loop:** a `while True` loop that calls `await camel_agent.astep(...)` with a prompt telling the agent to check for messages (e.g. with `wait_for_mentions`) and act on them, sleeps with `asyncio.sleep()` (e.g. 10 seconds) and catches exceptions.
5.  **Entry Point:** `if __name__ == "__main__": asyncio.run(main())` with `KeyboardInterrupt` handling.
6.  **Integration (Placeholder):** Add comments showing where the original agent's logic, classes or functions (identified from the context) could be imported or called. DO NOT implement this integration yourself.
7.  **Output Format:** Respond ONLY with the generated Python code enclosed in a single ```python ... ``` block. Do not include any other text, explanations, or introductions.

**Context from Cloned Repository:**

**File Structure:**
```
{file_tree}
```

**Code Snippets:**
```python
{code_context}
```

**Example Output:**
```python
{example}
```

Generate the `coral_wrapper.py` content based *only* on the requirements and the provided context.
"#,
        coral_url = ctx.coral_server_url,
        agent_id = ctx.agent_id,
        file_tree = ctx.file_tree,
        code_context = ctx.code_context,
        example = example,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> PromptContext<'static> {
        PromptContext {
            coral_server_url: "http://localhost:3001/sse",
            agent_id: "weather_agent",
            file_tree: "./\n    main.py\n",
            code_context: "\n--- File: main.py ---\nimport asyncio\n",
        }
    }

    #[test]
    fn test_prompt_embeds_context() {
        let prompt = generation_system_prompt(&context());

        assert!(prompt.contains("./\n    main.py\n"));
        assert!(prompt.contains("--- File: main.py ---"));
        assert!(prompt.contains("defaulting to 'http://localhost:3001/sse' and 'weather_agent'"));
        assert!(prompt.contains("Respond ONLY with the generated Python code"));
    }

    #[test]
    fn test_literal_braces_survive_formatting() {
        let prompt = generation_system_prompt(&context());
        assert!(prompt.contains("agent ID '{agent_id}'"));
    }

    #[test]
    fn test_example_output_filled_in() {
        let example = example_output("http://coral:3001/sse", "my_agent");
        assert!(example.contains(r#"os.getenv("CORAL_SERVER_URL", "http://coral:3001/sse")"#));
        assert!(example.contains(r#"os.getenv("CORAL_AGENT_ID", "my_agent")"#));
        assert!(!example.contains("{{"));
    }
}
