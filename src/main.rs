use std::sync::Arc;

use chatbot_widget::api::{AppState, api_routes};
use chatbot_widget::config::Config;
use chatbot_widget::flow::table::FlowTable;
use chatbot_widget::probe;
use chatbot_widget::proxy::Upstream;
use chatbot_widget::session::SessionStore;
use chatbot_widget::tags::ComponentRegistry;
use chatbot_widget::widget::widget_routes;
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env()?;
    let table = Arc::new(FlowTable::load(config.flows_path.as_deref()));

    eprintln!("💬 Chatbot Widget v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.rag_api_base);
    eprintln!("   Listening: http://0.0.0.0:{}", config.port);
    eprintln!("   Flows: {} loaded", table.flows.len());
    eprintln!(
        "   Probe: every {}s (chat timeout {}s, health timeout {}s)\n",
        config.probe_interval.as_secs(),
        config.chat_timeout.as_secs(),
        config.health_timeout.as_secs(),
    );

    let upstream = Upstream::new(
        config.rag_api_base.clone(),
        config.chat_timeout,
        config.health_timeout,
    );
    let (probe_rx, _probe_handle) = probe::spawn_probe(upstream.clone(), config.probe_interval);

    let state = AppState {
        table,
        registry: Arc::new(ComponentRegistry::builtin()),
        sessions: Arc::new(SessionStore::new()),
        upstream,
        probe: probe_rx,
    };

    let app = api_routes(state.clone())
        .merge(widget_routes(state))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "Widget gateway started");
    axum::serve(listener, app).await?;

    Ok(())
}
