use coral_cli::cli::commands::{CliArgs, Commands, CoralizeTarget};
use coral_cli::cli::handlers::{
    handle_coralize_github, handle_coralize_mcp, handle_init, handle_interface, handle_server, handle_version,
};
use coral_cli::util::logging::{config_for_cli, init_logging};
use coral_cli::VERSION;

use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging(config_for_cli(args.log_level.as_deref(), args.verbose, args.quiet));

    debug!("coral v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Init(init_args) => handle_init(init_args),
        Commands::Version => handle_version(),
        Commands::Interface(interface_args) => handle_interface(interface_args),
        Commands::Server(server_args) => handle_server(server_args).await,
        Commands::Coralize(coralize_args) => match &coralize_args.target {
            CoralizeTarget::Github(github_args) => handle_coralize_github(github_args).await,
            CoralizeTarget::Mcp(mcp_args) => handle_coralize_mcp(mcp_args).await,
        },
    };

    std::process::exit(exit_code);
}
