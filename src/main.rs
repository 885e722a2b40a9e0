use doc_chat::api::{create_router, AppState};
use doc_chat::infrastructure::{AppConfig, ChatOrchestrator};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_chat=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    info!(
        llm = %config.config.llm.provider,
        model = %config.config.llm.model,
        embedding = %config.config.embedding.provider,
        chunk_size = config.config.rag.chunk_size,
        top_k = config.config.rag.top_k,
        "configuration loaded"
    );

    let orchestrator = ChatOrchestrator::from_config(&config)?;
    let addr = SocketAddr::new(
        config.config.server.host.parse()?,
        config.config.server.port,
    );

    let state = AppState::new(orchestrator, config)?;
    let _sweeper = state.spawn_session_sweeper();
    let app = create_router(state);

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
