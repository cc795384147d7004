//! Cross-sell server entry point

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crosssell_server::config::Config;
use crosssell_server::pipeline::Predictor;
use crosssell_server::storage::ArtifactBackend;
use crosssell_server::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the filter reads RUST_LOG
    dotenvy::dotenv().ok();

    // Initialize logging; LOG_FORMAT=json for machine-readable output
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "crosssell_server=debug,tower_http=debug".into());

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = Config::from_env();

    tracing::info!("Cross-sell server starting ({})...", config.environment);
    tracing::info!(
        bucket = %config.model.bucket,
        model = %config.model.model_path,
        preprocessor = %config.model.preprocessor_path,
        format = %config.model.model_format,
        "Artifact location"
    );

    // Artifacts are fetched lazily on the first prediction
    let store = ArtifactBackend::from_settings(&config.storage)
        .context("Failed to initialise artifact storage")?;
    tracing::info!("Storage backend: {}", store.name());

    let predictor = Predictor::new(store, config.model.clone());
    let state = AppState::new(predictor, config.clone());

    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("🚀 Server listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
