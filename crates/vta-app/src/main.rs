//! Virtual TA binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//!    (`--write-config` saves the effective configuration and exits)
//! 2. Initialize tracing (stderr, so stdout carries only the conversation)
//! 3. Build the completion client, knowledge store, and session
//! 4. Run the interactive console until EOF or `:quit`

mod cli;
mod console;

use std::sync::Arc;

use clap::Parser;
use vta_chat::{
    ContextAugmenter, HttpCompletionClient, HttpKnowledgeStore, SessionController, UploadRegistry,
};
use vta_core::VtaConfig;

use crate::cli::CliArgs;
use crate::console::Console;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config first: it decides the log level.
    let config_file = args.resolve_config_path();
    let config_found = config_file.exists();
    let mut config = VtaConfig::load_or_default(&config_file)?;
    args.apply(&mut config);

    // Tracing.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Virtual TA v{}", env!("CARGO_PKG_VERSION"));
    if config_found {
        tracing::info!(path = %config_file.display(), "Configuration loaded");
    } else {
        tracing::info!(path = %config_file.display(), "No configuration file, using defaults");
    }

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    if args.write_config {
        config.save(&config_file)?;
        tracing::info!(path = %config_file.display(), "Configuration written");
        return Ok(());
    }

    // Chat session.
    let completion = HttpCompletionClient::new(&config.completion)?;
    tracing::info!(
        endpoint = %config.completion.endpoint,
        model = %config.completion.model,
        "Completion client ready"
    );
    let session = Arc::new(
        SessionController::new(Arc::new(completion), ContextAugmenter::default())
            .with_augment(config.knowledge.augment_by_default),
    );

    // Knowledge base.
    let store = HttpKnowledgeStore::new(&config.knowledge)?;
    tracing::info!(base_url = %config.knowledge.base_url, "Knowledge store configured");
    let registry = Arc::new(UploadRegistry::new(
        Arc::new(store),
        config.knowledge.accepted_extensions.clone(),
    ));

    Console::new(session, registry).run().await?;

    Ok(())
}
