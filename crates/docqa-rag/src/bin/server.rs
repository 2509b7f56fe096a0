//! Document Q&A server binary
//!
//! Run with: cargo run -p docqa-rag --bin docqa-rag-server

use docqa_rag::{config::BackendProvider, providers::Backend, server::RagServer, RagConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = RagConfig::load()?;
    let backend = Backend::from_config(&config)?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Backend: {}", backend.describe());
    tracing::info!("  - Chunk size: {} (overlap {})", config.chunking.chunk_size, config.chunking.chunk_overlap);
    tracing::info!("  - Top k: {}", config.retrieval.top_k);
    tracing::info!("  - Upload dir: {}", config.server.upload_dir.display());

    // Check backend
    if backend.health_check().await {
        tracing::info!("Model backend is available");
    } else {
        match config.backend.provider {
            BackendProvider::Ollama => {
                tracing::warn!("Ollama not available at {}", config.ollama.base_url);
                tracing::warn!("Please start Ollama:");
                tracing::warn!("  1. Start: ollama serve");
                tracing::warn!(
                    "  2. Pull models: ollama pull {} && ollama pull {}",
                    config.ollama.embed_model,
                    config.ollama.generate_model
                );
            }
            BackendProvider::OpenAi => {
                tracing::warn!("OpenAI API not reachable at {}", config.openai.base_url);
                tracing::warn!("Check OPENAI_API_KEY and network access");
            }
        }
    }

    let server = RagServer::new(config, backend);

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /upload - Upload a document");
    println!("  POST /ask    - Ask a question about it");
    println!("  GET  /info   - Service info");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
