//! Codeforge CLI — the main entry point.
//!
//! Commands:
//! - `run`    — Execute one code generation run end to end
//! - `tools`  — List the registered tool catalog
//! - `config` — Show the effective configuration

use clap::{Parser, Subcommand};
use codeforge_agent::Router;
use codeforge_config::AppConfig;
use codeforge_core::event::EventBus;
use codeforge_core::run::RunRequest;
use codeforge_core::sandbox::SandboxClient;
use codeforge_sandbox::{HttpSandboxClient, LocalSandboxClient};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "codeforge",
    about = "Codeforge — sandboxed code generation agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one code generation run
    Run {
        /// What to build
        prompt: String,

        /// Caller-assigned run ID (generated if omitted)
        #[arg(long)]
        run_id: Option<String>,

        /// Project this run belongs to
        #[arg(long, default_value = "default")]
        project: String,

        /// Reuse an existing sandbox instead of provisioning one
        #[arg(long)]
        sandbox_id: Option<String>,

        /// Use a process-local sandbox rooted at this directory
        #[arg(long)]
        local: Option<PathBuf>,
    },

    /// List the registered tool catalog
    Tools,

    /// Show the effective configuration
    Config {
        /// Print a default config.toml instead
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            prompt,
            run_id,
            project,
            sandbox_id,
            local,
        } => run(prompt, run_id, project, sandbox_id, local).await?,
        Commands::Tools => tools()?,
        Commands::Config { default } => config(default)?,
    }

    Ok(())
}

async fn run(
    prompt: String,
    run_id: Option<String>,
    project: String,
    sandbox_id: Option<String>,
    local: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    let provider = codeforge_providers::from_config(&config);

    let client: Arc<dyn SandboxClient> = match &local {
        Some(root) => Arc::new(LocalSandboxClient::new(root)),
        None => Arc::new(HttpSandboxClient::new(&config.sandbox.api_url, None)),
    };

    let sandbox_id = match sandbox_id {
        Some(id) => id,
        None => client.create(&config.sandbox.template).await?,
    };
    let sandbox = client.connect(&sandbox_id).await?;

    let registry = Arc::new(codeforge_tools::default_registry()?);
    let event_bus = Arc::new(EventBus::default());

    let mut router = Router::new(
        provider,
        &config.provider.model,
        config.provider.temperature,
        registry,
        event_bus,
    )
    .with_max_iterations(config.agent.max_iterations)
    .with_sandbox_port(config.sandbox.port);

    if let Some(max_tokens) = config.provider.max_tokens {
        router = router.with_max_tokens(max_tokens);
    }
    if let Some(system_prompt) = &config.agent.system_prompt {
        router = router.with_system_prompt(system_prompt);
    }

    let request = RunRequest {
        run_id: run_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        prompt,
        project_id: project,
    };

    let result = router.run(&request, sandbox).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

fn tools() -> Result<(), Box<dyn std::error::Error>> {
    let registry = codeforge_tools::default_registry()?;
    let mut definitions = registry.definitions();
    definitions.sort_by(|a, b| a.name.cmp(&b.name));

    for def in definitions {
        println!("{:<24} {}", def.name, def.description);
    }
    Ok(())
}

fn config(default: bool) -> Result<(), Box<dyn std::error::Error>> {
    if default {
        print!("{}", AppConfig::default_toml());
    } else {
        println!("{:#?}", AppConfig::load()?);
    }
    Ok(())
}
