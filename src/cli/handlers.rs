//! Command handlers
//!
//! Each handler runs one subcommand and returns the process exit code:
//! 0 on success, 1 on failure and 130 when the operator interrupted a run.

use super::commands::{GithubArgs, InitArgs, InterfaceArgs, McpArgs, ServerArgs};
use crate::config::{CoralConfig, API_KEY_ENV};
use crate::coralizer::{
    BuildRunOutcome, CoralizationPipeline, CoralizationRequest, CoralizeError, DockerCli, GitCli, McpCoralizer, ModelSettings,
    PipelineSettings, SourceReference,
};
use crate::interface::{render_interface_agent, write_interface_agent};
use crate::progress::LoggingHandler;
use crate::server::ServerLaunch;
use crate::templates::{find_template, generate_project};
use crate::VERSION;
use anyhow::{Context, Result};
use std::env;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Resolves when the operator presses Ctrl+C.
///
/// The listener is registered before this returns, so a SIGINT that arrives
/// while the returned future is not being polled still resolves it instead of
/// killing the process.
#[cfg(unix)]
fn ctrl_c() -> impl Future<Output = ()> {
    use tokio::signal::unix::{signal, SignalKind};

    let listener = signal(SignalKind::interrupt());
    async move {
        match listener {
            Ok(mut sigint) => {
                sigint.recv().await;
                info!("Interrupt received");
            }
            Err(e) => {
                warn!("Unable to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(windows)]
fn ctrl_c() -> impl Future<Output = ()> {
    let listener = tokio::signal::windows::ctrl_c();
    async move {
        match listener {
            Ok(mut ctrl_c) => {
                ctrl_c.recv().await;
                info!("Interrupt received");
            }
            Err(e) => {
                warn!("Unable to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
}

fn credential_from_env() -> Option<String> {
    env::var(API_KEY_ENV).ok().filter(|v| !v.trim().is_empty())
}

fn report(err: &CoralizeError) -> i32 {
    error!("{}", err);
    eprintln!("{}", err.help_message());
    EXIT_FAILURE
}

pub fn handle_version() -> i32 {
    println!("Coral CLI version: {}", VERSION);
    EXIT_SUCCESS
}

pub fn handle_init(args: &InitArgs) -> i32 {
    match init_project(args) {
        Ok(files) => {
            println!("Created project in {}", args.output_dir.display());
            for file in files {
                println!("  {}", file.display());
            }
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_FAILURE
        }
    }
}

fn init_project(args: &InitArgs) -> Result<Vec<PathBuf>> {
    let template = find_template(&args.framework, &args.language)?;
    generate_project(template, &args.output_dir)
        .with_context(|| format!("Failed to create {} project", template.key()))
}

pub fn handle_interface(args: &InterfaceArgs) -> i32 {
    let script = render_interface_agent(&args.coral_url, &args.agent_id);
    match write_interface_agent(&script, args.output.as_deref()).context("Failed to write interface agent") {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_FAILURE
        }
    }
}

pub async fn handle_server(args: &ServerArgs) -> i32 {
    let launch = match (&args.jar, &args.image) {
        (Some(jar), _) => ServerLaunch::Jar(jar.clone()),
        (None, Some(image)) => ServerLaunch::Image {
            image: image.clone(),
            port: args.port,
            name: args.name.clone(),
        },
        (None, None) => {
            eprintln!("Error: pass either --jar or --image");
            return EXIT_FAILURE;
        }
    };

    let interrupt = ctrl_c();
    match launch.run(&DockerCli::default(), interrupt).await {
        Ok(exit) => exit.exit_code(),
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e.help_message());
            EXIT_FAILURE
        }
    }
}

pub async fn handle_coralize_github(args: &GithubArgs) -> i32 {
    let Some(credential) = credential_from_env() else {
        return report(&CoralizeError::MissingCredential { var: API_KEY_ENV });
    };
    let interrupt = ctrl_c();

    let mut config = CoralConfig::default();
    if let Some(provider) = args.provider {
        config.provider = provider;
    }
    if let Some(ref model) = args.model {
        config.model = model.clone();
    }
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return EXIT_FAILURE;
    }
    debug!("{}", config);

    let mut source = SourceReference::new(&args.repo_url);
    if let Some(ref branch) = args.branch {
        source = source.with_branch(branch);
    }
    let request = CoralizationRequest::new(source, &args.agent_id)
        .with_coral_server_url(&args.coral_url)
        .with_credential(credential);

    let pipeline = CoralizationPipeline::new(
        Arc::new(config.create_client()),
        Arc::new(GitCli::default()),
        Arc::new(DockerCli::default()),
        PipelineSettings::from(&config),
    )
    .with_progress(Arc::new(LoggingHandler));

    if args.dry_run {
        let output = args.output.clone().unwrap_or_else(|| PathBuf::from("."));
        return match pipeline.generate_to(&request, &output, interrupt).await {
            Ok(Some(_)) => {
                println!("Generated files written to {}", output.display());
                EXIT_SUCCESS
            }
            Ok(None) => {
                info!("Coralization interrupted by user");
                BuildRunOutcome::UserInterrupted.exit_code()
            }
            Err(e) => report(&e),
        };
    }

    match pipeline.run(&request, interrupt).await {
        Ok(outcome) => {
            let code = outcome.exit_code();
            match outcome.into_result() {
                Ok(true) => info!("Coralization interrupted by user"),
                Ok(false) => info!(image = %request.image_name(), "Coralization finished"),
                Err(e) => return report(&e),
            }
            code
        }
        Err(e) => report(&e),
    }
}

pub async fn handle_coralize_mcp(args: &McpArgs) -> i32 {
    let Some(credential) = credential_from_env() else {
        return report(&CoralizeError::MissingCredential { var: API_KEY_ENV });
    };

    let interrupt = ctrl_c();
    let config = CoralConfig::default();
    let mut coralizer = McpCoralizer::new(&args.mcp_url, &args.agent_id);
    coralizer.coral_server_url = args.coral_url.clone();
    coralizer.system_message = args.system_message.clone();
    coralizer.model = ModelSettings {
        temperature: args.temperature,
        max_tokens: args.max_tokens,
    };

    let result = coralizer
        .build_and_run(&DockerCli::default(), &credential, config.cleanup_policy(), interrupt)
        .await;

    match result {
        Ok(outcome) => {
            let code = outcome.exit_code();
            match outcome.into_result() {
                Ok(_) => code,
                Err(e) => report(&e),
            }
        }
        Err(e) => report(&e),
    }
}
