//! Steward agent - main entry point.
//!
//! Loads the JSON configuration, spawns the configured tool host, builds the
//! completion provider, and runs either the terminal chat loop or the HTTP
//! server over one initialized agent.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use steward::agent::Agent;
use steward::host::StdioToolHost;
use steward::provider::build_provider;
use steward::types::BackendKind;
use steward::{repl, server, Config};

#[derive(Parser, Debug)]
#[command(name = "steward", version, about = "Chat agent grounded in MCP tool results")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "steward.config.json", env = "STEWARD_CONFIG")]
    config: PathBuf,

    /// Tool host entry to use (defaults to the sole configured entry).
    #[arg(long)]
    server: Option<String>,

    /// Provider backend override: anthropic, openai, or pattern.
    #[arg(long)]
    provider: Option<String>,

    /// Model identifier override.
    #[arg(long)]
    model: Option<String>,

    /// Serve HTTP instead of the terminal loop; optional bind address
    /// overrides the configured one.
    #[arg(long, value_name = "ADDR")]
    serve: Option<Option<String>>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = Config::from_file(&cli.config)?;
    if let Some(backend) = &cli.provider {
        config.provider.backend = backend.parse::<BackendKind>()?;
    }
    if let Some(model) = &cli.model {
        config.provider.model = Some(model.clone());
    }

    steward::observability::init_tracing(&config.observability.log_level);

    let (host_name, spec) = config.host_spec(cli.server.as_deref())?;
    let host_name = host_name.to_string();
    let spec = spec.clone();
    tracing::info!(host = %host_name, backend = ?config.provider.backend, "starting steward");

    let host = StdioToolHost::new(spec, config.limits.request_timeout);
    let provider = build_provider(&config.provider, &config.limits);
    let mut agent = Agent::new(
        Box::new(host),
        provider,
        config.provider.default_tool.clone(),
    );
    agent.initialize().await?;

    match cli.serve {
        Some(addr) => {
            let addr = addr.unwrap_or_else(|| config.server.listen_addr.clone());
            let agent = Arc::new(Mutex::new(agent));
            let served = server::serve(Arc::clone(&agent), &addr).await;
            agent.lock().await.close().await;
            served?;
        }
        None => {
            let chatted = repl::run(&mut agent).await;
            agent.close().await;
            chatted?;
        }
    }

    Ok(())
}
