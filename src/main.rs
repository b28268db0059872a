//! Intake agent binary.
//!
//! `intake-agent` serves the REST and WebSocket API.
//! `intake-agent console` runs one conversation over stdin/stdout instead.

use std::error::Error;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use intake_agent::adapters::{
    create_router, InMemoryConversationStore, IntakeAppState, MeteredAIProvider, OpenAIProvider,
};
use intake_agent::application::handlers::intake::{
    GetConversationHandler, GetConversationQuery, ProcessTurnCommand, ProcessTurnHandler,
    StartConversationCommand, StartConversationHandler,
};
use intake_agent::config::{load_agent_definition, AppConfig, LoggingConfig};
use intake_agent::domain::turn::AgentContext;
use intake_agent::ports::{AIProvider, ConversationStore};

fn init_tracing(config: &LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "intake_agent={},tower_http=info",
            config.level.to_lowercase()
        )
        .into()
    });

    // stdout carries the console conversation
    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);
    config.validate()?;

    let ai: Arc<dyn AIProvider> = Arc::new(MeteredAIProvider::new(OpenAIProvider::new(
        config.ai.openai_config(),
    )?));
    let store: Arc<dyn ConversationStore> = Arc::new(InMemoryConversationStore::new());

    match std::env::args().nth(1).as_deref() {
        Some("console") => {
            let definition = load_agent_definition(&config.agent.definition_path)?;
            let context = AgentContext::new(definition, ai)?;
            run_console(context, store).await
        }
        Some(other) => {
            Err(format!("unknown command '{}'; expected 'console' or nothing", other).into())
        }
        None => serve(&config, ai, store).await,
    }
}

async fn serve(
    config: &AppConfig,
    ai: Arc<dyn AIProvider>,
    store: Arc<dyn ConversationStore>,
) -> Result<(), Box<dyn Error>> {
    let mut state = IntakeAppState::new(store, ai.clone(), config.server.configs_dir.clone());

    // The server can start without an agent; PUT /config loads one later.
    match load_agent_definition(&config.agent.definition_path) {
        Ok(definition) => state = state.with_agent(AgentContext::new(definition, ai)?),
        Err(e) => warn!(error = %e, "no agent loaded at startup"),
    }

    let app = create_router(state, &config.server);
    let addr = config.server.socket_addr()?;
    info!(%addr, "intake agent listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

async fn run_console(
    context: AgentContext,
    store: Arc<dyn ConversationStore>,
) -> Result<(), Box<dyn Error>> {
    let start = StartConversationHandler::new(context.clone(), store.clone());
    let turns = ProcessTurnHandler::new(context, store.clone());
    let view = GetConversationHandler::new(store);

    let started = start.handle(StartConversationCommand::default()).await?;
    let session_id = started.session_id;

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(format!("agent> {}\nyou> ", started.greeting).as_bytes())
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            stdout.write_all(b"you> ").await?;
            stdout.flush().await?;
            continue;
        }

        let result = match turns
            .handle(ProcessTurnCommand {
                session_id,
                utterance: line,
            })
            .await
        {
            Ok(result) => result,
            Err(err) => {
                error!(%session_id, error = %err, "turn failed");
                break;
            }
        };

        stdout
            .write_all(format!("agent> {}\n", result.reply).as_bytes())
            .await?;
        if !result.status.accepts_turns() {
            break;
        }
        stdout.write_all(b"you> ").await?;
        stdout.flush().await?;
    }

    let summary = view.handle(GetConversationQuery { session_id }).await?;
    info!(%session_id, status = %summary.status, "conversation ended");
    stdout
        .write_all(format!("{}\n", serde_json::to_string_pretty(&summary)?).as_bytes())
        .await?;
    stdout.flush().await?;
    Ok(())
}
