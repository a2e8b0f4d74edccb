//! Verbatim UI server binary
//!
//! Run with: cargo run -p verbatim-qa --bin verbatim-ui

use std::path::PathBuf;

use verbatim_qa::{config::env, server::VerbatimServer, VerbatimConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "verbatim_qa=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                     Verbatim RAG                          ║
║        PDF Q&A answered in the documents' own words       ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Optional config file as the single argument, else $VERBATIM_CONFIG
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = VerbatimConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Documents: {}", config.paths.docs_dir.display());
    tracing::info!("  - Index: {}", config.paths.db_path.display());
    tracing::info!("  - Sparse model: {}", config.index.sparse_model);
    tracing::info!(
        "  - Span extractor: {}",
        config.extractor.model.as_deref().unwrap_or("lexical")
    );

    if let Some(model) = &config.extractor.model {
        tracing::info!("Checking Ollama at {}...", config.extractor.base_url);
        let client = reqwest::Client::new();
        match client
            .get(format!("{}/api/tags", config.extractor.base_url))
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => tracing::info!("Ollama is running"),
            _ => {
                tracing::warn!("Ollama not available at {}", config.extractor.base_url);
                tracing::warn!("Questions will fail until it is up:");
                tracing::warn!("  ollama serve && ollama pull {}", model);
                tracing::warn!("Or unset {} to use the lexical extractor", env::EXTRACTOR);
            }
        }
    }

    let server = VerbatimServer::new(config)?;

    println!("\nServer starting...");
    println!("  UI: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API status: http://{}/api/status", server.address());
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
