// Main entry point for the API server

use std::sync::Arc;

use anyhow::{Context, Result};
use gemini_client::GeminiClient;
use server_core::domains::posts::DevToClient;
use server_core::domains::seo::{DashboardState, RelatedPostSources};
use server_core::kernel::scheduled_tasks::start_scheduler;
use server_core::kernel::{
    GeminiAi, JobRegistry, NoopCaptionSource, NoopDocumentExtractor, NoopTranscriber, ProgressHub,
    ServerDeps,
};
use server_core::server::app::{build_app, AxumAppState};
use server_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting JustSpeak API server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Build the Gemini client
    let mut gemini = GeminiClient::new(config.gemini_api_key.clone())
        .context("Failed to create Gemini client")?;
    if let Some(model) = &config.gemini_model {
        gemini = gemini.with_model(model.clone());
    }
    if let Some(base_url) = &config.gemini_api_url {
        gemini = gemini.with_base_url(base_url.clone());
    }
    tracing::info!(model = %gemini.model(), "Gemini client ready");

    // Assemble shared dependencies
    let deps = Arc::new(ServerDeps::new(
        Arc::new(GeminiAi::new(gemini)),
        Arc::new(NoopCaptionSource),
        Arc::new(NoopTranscriber),
        Arc::new(NoopDocumentExtractor),
        JobRegistry::new(),
        ProgressHub::new(),
        config.raw_log_dir.clone(),
    ));
    let dashboard = Arc::new(DashboardState::new());
    let related_sources =
        Arc::new(RelatedPostSources::new().context("Failed to build related-post sources")?);
    let devto = Arc::new(
        DevToClient::new(config.devto_api_key.clone())
            .context("Failed to create Dev.to client")?,
    );

    // Start scheduled housekeeping (job sweep + cache prune)
    let _scheduler = start_scheduler(deps.jobs.clone(), dashboard.clone())
        .await
        .context("Failed to start scheduler")?;

    // Build application
    let state = AxumAppState {
        deps,
        dashboard,
        related_sources,
        devto,
    };
    let app = build_app(state, &config.allowed_origins);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("GraphQL playground: http://localhost:{}/graphql", config.port);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
