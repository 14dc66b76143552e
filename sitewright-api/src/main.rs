use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use clap::Parser;
use sitewright_agents::{ConversationAgent, InMemorySessionStore, SessionStore};
use sitewright_api::config::{ApiConfig, CorsConfig, LoggingConfig};
use sitewright_api::helpers::bridge::start_bridge;
use sitewright_api::helpers::llm::create_llm_client;
use sitewright_api::{configure_routes, AppState};
use sitewright_tools::ToolServer;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "sitewright-api", version, about = "Conversational website builder API")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Port to listen on, overriding configuration and PORT
    #[arg(short, long)]
    port: Option<u16>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_path) = ApiConfig::load(cli.config.as_deref())?;
    let config = config.with_port(cli.port);
    let _log_guard = init_tracing(&config.logging)?;
    info!(path = %config_path.display(), "Loaded configuration");

    let bridge = start_bridge(config.bridge_config()).await;
    let tools: Arc<dyn ToolServer> = bridge.clone();

    let agent = create_llm_client(&config.llm)?.map(|client| {
        Arc::new(
            ConversationAgent::new(client, tools.clone())
                .with_sampling(config.llm.sampling())
                .with_max_tool_rounds(config.llm.max_tool_rounds),
        )
    });

    let sessions = match config.sessions.max_sessions {
        Some(max) => InMemorySessionStore::new().with_max_sessions(max),
        None => InMemorySessionStore::new(),
    };
    let sessions: Arc<dyn SessionStore> = Arc::new(sessions);

    let state = web::Data::new(AppState::new(agent, tools, sessions));
    let cors_config = config.cors.clone();
    let bind_addr = config.bind_address();
    info!("Starting sitewright-api at http://{}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors(&cors_config))
            .wrap(Logger::default())
            .configure(configure_routes)
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    info!("Shutting down");
    bridge.stop().await;
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &logging.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)?;
            let appender = tracing_appender::rolling::daily(directory, &logging.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

fn cors(config: &CorsConfig) -> Cors {
    if config.allowed_origins.iter().any(|origin| origin == "*") {
        return Cors::permissive();
    }

    config.allowed_origins.iter().fold(
        Cors::default()
            .allow_any_method()
            .allow_any_header()
            .supports_credentials(),
        |cors, origin| cors.allowed_origin(origin),
    )
}
