use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use swastik_adaptor_terminal::{TerminalAdaptor, TerminalConfig};
use swastik_adaptor_web::{SimpleUiConfig, SimpleUiServer};
use swastik_core::{
    init_logging_with, load_env, load_env_from_path, AgentBackend, ChatSession, Result,
};
use swastik_provider_openrouter::{OpenRouterClient, AVAILABLE_MODELS};
use swastik_provider_orchestrate::{Credential, OrchestrateClient};
use swastik_provider_router::FallbackRouter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum UiMode {
    Web,
    Terminal,
}

/// SWASTIK orchestration copilot
#[derive(Parser, Debug)]
#[command(name = "run-agent-ui", version)]
struct Cli {
    /// Chat surface to start
    #[arg(long, value_enum, env = "SWASTIK_UI", default_value = "web")]
    mode: UiMode,

    #[arg(long, env = "SIMPLE_UI_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "SIMPLE_UI_PORT", default_value_t = 4000)]
    port: u16,

    #[arg(long, env = "SWASTIK_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Read backend settings from this file instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Stream scrubbed logs into the UI (web) or stderr (terminal)
    #[arg(long, env = "UI_LOGS_ENABLED")]
    logs: bool,

    /// Terminal mode: only echo log events whose target or message contains this text
    #[arg(long, env = "SWASTIK_LOG_FILTER")]
    log_filter: Option<String>,

    /// Print backend configuration and check OpenRouter connectivity, then exit
    #[arg(long)]
    check: bool,

    /// Print the OpenRouter models known to work, then exit
    #[arg(long)]
    list_models: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    // terminal chat owns stdout/stderr; logs reach it only through --logs
    let console_logs = cli.mode == UiMode::Web || cli.check;
    init_logging_with(&cli.log_level, console_logs);
    match &cli.env_file {
        Some(path) => load_env_from_path(path)?,
        None => load_env()?,
    }

    if cli.list_models {
        print_models();
        return Ok(());
    }

    let orchestrate = Arc::new(OrchestrateClient::from_env());
    let openrouter = Arc::new(OpenRouterClient::from_env());

    if cli.check {
        check(&orchestrate, &openrouter).await;
        return Ok(());
    }

    for (tier, missing) in [
        ("primary", orchestrate.config().missing()),
        ("secondary", openrouter.config().missing()),
    ] {
        if !missing.is_empty() {
            tracing::warn!(tier, "not configured, missing {}", missing.join(", "));
        }
    }

    let router = FallbackRouter::new(orchestrate, openrouter);
    let session = Arc::new(ChatSession::new(router));

    match cli.mode {
        UiMode::Web => {
            let ui = SimpleUiServer::new(
                SimpleUiConfig {
                    enabled: true,
                    host: cli.host.clone(),
                    port: cli.port,
                    logs_enabled: cli.logs,
                },
                session,
            );
            if let Some(handle) = ui.start().await? {
                println!("SWASTIK chat: http://{}:{}/", cli.host, cli.port);
                // the server shuts down gracefully on Ctrl-C
                if let Err(e) = handle.await {
                    tracing::error!("web UI task failed: {}", e);
                }
            }
        }
        UiMode::Terminal => {
            let term = TerminalAdaptor::new(
                TerminalConfig {
                    show_logs: cli.logs,
                    target_filter: cli.log_filter.clone(),
                },
                session,
            );
            term.run().await?;
        }
    }
    Ok(())
}

fn print_models() {
    println!("OpenRouter models (set OPENROUTER_MODEL):");
    for (id, label) in AVAILABLE_MODELS {
        println!("  {:<36} {}", id, label);
    }
}

fn status(set: bool) -> &'static str {
    if set {
        "set"
    } else {
        "not set"
    }
}

async fn check(orchestrate: &OrchestrateClient, openrouter: &OpenRouterClient) {
    let wxo = orchestrate.config();
    let credential = match &wxo.credential {
        Some(Credential::Bearer(_)) => "bearer token",
        Some(Credential::IamApiKey(_)) => "IBM API key",
        None => "not set",
    };
    println!("Primary: {} ({})", orchestrate.name(), wxo.base_url);
    println!("  WXO_AGENT_ID        {}", status(wxo.agent_id.is_some()));
    println!("  credential          {}", credential);

    let or = openrouter.config();
    println!("Secondary: {} ({})", openrouter.name(), or.base_url);
    println!("  OPENROUTER_API_KEY  {}", status(or.api_key.is_some()));
    println!("  OPENROUTER_MODEL    {}", or.model);
    println!();

    if or.api_key.is_none() {
        println!("OpenRouter check skipped: OPENROUTER_API_KEY not set");
        return;
    }
    match openrouter.check_connection().await {
        Ok(report) => {
            println!(
                "OpenRouter reachable (HTTP {}), {} models available",
                report.status, report.model_count
            );
            for id in &report.popular {
                println!("  - {}", id);
            }
        }
        Err(e) => println!("OpenRouter check failed: {}", e),
    }
}
