pub mod commands;
pub mod handlers;

pub use commands::{
    CliArgs, Commands, CoralizeArgs, CoralizeTarget, GithubArgs, InitArgs, InterfaceArgs, McpArgs, ServerArgs,
};
