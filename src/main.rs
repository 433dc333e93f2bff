use std::sync::Arc;

use scam_check::{blob, gemini::GeminiClient, image, router, Analyzer, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env();
    if config.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; analyze requests will fail");
    }
    if config.blob_token.is_none() {
        tracing::info!("BLOB_READ_WRITE_TOKEN is not set; upload cleanup disabled");
    }

    let http = image::build_client(config.image_timeout)?;
    let model = Arc::new(GeminiClient::new(&config)?);
    let blobs = blob::store_from_config(&config, http.clone());
    let analyzer = Arc::new(Analyzer::new(&config, http, model, blobs));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(
        profile = config.profile.name,
        model = %config.profile.model,
        "listening on {}",
        listener.local_addr()?
    );
    axum::serve(listener, router(analyzer)).await?;
    Ok(())
}
