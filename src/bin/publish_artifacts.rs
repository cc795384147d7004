//! Upload a trained model and its preprocessor to artifact storage

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crosssell_server::config::Config;
use crosssell_server::publish::{publish_artifacts, PublishRequest};
use crosssell_server::storage::ArtifactBackend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "crosssell_server=info,publish_artifacts=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let request = PublishRequest::from_env()?;

    let store = ArtifactBackend::from_settings(&config.storage)
        .context("Failed to initialise artifact storage")?;

    tracing::info!(
        backend = store.name(),
        bucket = %config.model.bucket,
        format = %config.model.model_format,
        "Publishing artifacts"
    );

    let report = publish_artifacts(&store, &config.model, &request)
        .await
        .context("Publishing failed")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
