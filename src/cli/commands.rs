use crate::config::{parse_provider, DEFAULT_CORAL_SERVER_URL};
use crate::coralizer::mcp::DEFAULT_MCP_SYSTEM_MESSAGE;
use crate::interface::DEFAULT_INTERFACE_AGENT_ID;
use crate::server::{DEFAULT_SERVER_NAME, DEFAULT_SERVER_PORT};
use clap::{Args, Parser, Subcommand};
use genai::adapter::AdapterKind;
use std::path::PathBuf;

/// Command line tool for building agents on the Coral protocol
#[derive(Parser, Debug)]
#[command(
    name = "coral",
    about = "Scaffold, launch and coralize agents for the Coral multi-agent protocol",
    version,
    long_about = "coral scaffolds agent projects, starts the Coral chatroom server and turns \
                  existing agent repositories or MCP servers into containerized Coral agents."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug output")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Create a new agent project from a template",
        long_about = "Writes the files of an embedded project template.\n\n\
                      Examples:\n  \
                      coral init\n  \
                      coral init --framework langgraph --language python -o my-agent"
    )]
    Init(InitArgs),

    #[command(about = "Print the CLI version")]
    Version,

    #[command(
        about = "Generate the user interface agent script",
        long_about = "Renders the coordinator agent that talks to the human user on a \
                      Coral chatroom.\n\n\
                      Examples:\n  \
                      coral interface\n  \
                      coral interface --agent-id ui -o interface_agent.py"
    )]
    Interface(InterfaceArgs),

    #[command(
        about = "Start the Coral chatroom server",
        long_about = "Runs the server in the foreground from a jar or a container image. \
                      Press Ctrl+C to stop it.\n\n\
                      Examples:\n  \
                      coral server --jar coral-server.jar\n  \
                      coral server --image coralprotocol/coral-server --port 3001"
    )]
    Server(ServerArgs),

    #[command(about = "Turn an existing agent or MCP server into a Coral agent")]
    Coralize(CoralizeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    #[arg(short = 'f', long, default_value = "langgraph", help = "Agent framework")]
    pub framework: String,

    #[arg(short = 'l', long, default_value = "python", help = "Implementation language")]
    pub language: String,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        default_value = ".",
        help = "Directory to create the project in"
    )]
    pub output_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct InterfaceArgs {
    #[arg(long, value_name = "URL", default_value = DEFAULT_CORAL_SERVER_URL, help = "Chatroom SSE URL")]
    pub coral_url: String,

    #[arg(long, value_name = "ID", default_value = DEFAULT_INTERFACE_AGENT_ID, help = "Agent id to register with")]
    pub agent_id: String,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write the script to a file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    #[arg(
        long,
        value_name = "PATH",
        conflicts_with = "image",
        required_unless_present = "image",
        help = "Run the server jar with java"
    )]
    pub jar: Option<PathBuf>,

    #[arg(long, value_name = "IMAGE", help = "Run the server from a container image")]
    pub image: Option<String>,

    #[arg(long, default_value_t = DEFAULT_SERVER_PORT, help = "Port to publish in container mode")]
    pub port: u16,

    #[arg(long, default_value = DEFAULT_SERVER_NAME, help = "Container name in container mode")]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct CoralizeArgs {
    #[command(subcommand)]
    pub target: CoralizeTarget,
}

#[derive(Subcommand, Debug)]
pub enum CoralizeTarget {
    #[command(
        about = "Coralize an agent repository",
        long_about = "Clones the repository, generates a Coral wrapper with the generation \
                      agent, then builds and runs it in a container. Requires OPENAI_API_KEY.\n\n\
                      Examples:\n  \
                      coral coralize github https://github.com/org/agent --agent-id my_agent\n  \
                      coral coralize github https://github.com/org/agent --agent-id my_agent --dry-run -o out"
    )]
    Github(GithubArgs),

    #[command(
        about = "Coralize a running MCP server",
        long_about = "Renders a fixed wrapper that exposes the MCP server's tools on a Coral \
                      chatroom, then builds and runs it in a container.\n\n\
                      Examples:\n  \
                      coral coralize mcp --mcp-url http://localhost:8000/sse --agent-id weather"
    )]
    Mcp(McpArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GithubArgs {
    #[arg(value_name = "REPO_URL", help = "Repository to clone")]
    pub repo_url: String,

    #[arg(long, value_name = "BRANCH", help = "Branch to clone instead of the default")]
    pub branch: Option<String>,

    #[arg(long, value_name = "URL", default_value = DEFAULT_CORAL_SERVER_URL, help = "Chatroom SSE URL")]
    pub coral_url: String,

    #[arg(long, value_name = "ID", help = "Agent id the wrapper registers with")]
    pub agent_id: String,

    #[arg(long, help = "Write the generated files instead of building and running them")]
    pub dry_run: bool,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        requires = "dry_run",
        help = "Directory for --dry-run output (defaults to the current directory)"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        value_parser = parse_adapter_kind,
        help = "Generation provider (overrides CORAL_PROVIDER)"
    )]
    pub provider: Option<AdapterKind>,

    #[arg(short = 'm', long, value_name = "MODEL", help = "Generation model (overrides CORAL_MODEL)")]
    pub model: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct McpArgs {
    #[arg(long, value_name = "URL", help = "SSE URL of the MCP server to wrap")]
    pub mcp_url: String,

    #[arg(long, value_name = "URL", default_value = DEFAULT_CORAL_SERVER_URL, help = "Chatroom SSE URL")]
    pub coral_url: String,

    #[arg(long, value_name = "ID", help = "Agent id the wrapper registers with")]
    pub agent_id: String,

    #[arg(long, default_value = DEFAULT_MCP_SYSTEM_MESSAGE, help = "System message for the wrapping agent")]
    pub system_message: String,

    #[arg(long, default_value_t = 0.3, help = "Sampling temperature")]
    pub temperature: f32,

    #[arg(long, default_value_t = 4096, help = "Maximum tokens per completion")]
    pub max_tokens: u32,
}

fn parse_adapter_kind(s: &str) -> Result<AdapterKind, String> {
    parse_provider(s).map_err(|e| e.to_string())
}
