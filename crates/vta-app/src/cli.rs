//! CLI argument definitions for the Virtual TA.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use vta_core::VtaConfig;

/// Virtual TA: a terminal chat assistant backed by a chat-completion endpoint
/// and an optional knowledge base of course documents.
#[derive(Parser, Debug)]
#[command(name = "vta", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Chat-completion endpoint URL.
    #[arg(short = 'e', long = "endpoint")]
    pub endpoint: Option<String>,

    /// Model identifier sent with every completion request.
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,

    /// Origin of the knowledge-base upload/delete API.
    #[arg(short = 'k', long = "knowledge-url")]
    pub knowledge_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Start with knowledge-base augmentation switched on.
    #[arg(long = "augment")]
    pub augment: bool,

    /// Write the effective configuration to the config path and exit.
    #[arg(long = "write-config")]
    pub write_config: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > VTA_CONFIG env var > ~/.vta/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("VTA_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Overlay command-line values onto a loaded configuration.
    pub fn apply(&self, config: &mut VtaConfig) {
        if let Some(ref endpoint) = self.endpoint {
            config.completion.endpoint = endpoint.clone();
        }
        if let Some(ref model) = self.model {
            config.completion.model = model.clone();
        }
        if let Some(ref url) = self.knowledge_url {
            config.knowledge.base_url = url.clone();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if self.augment {
            config.knowledge.augment_by_default = true;
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".vta").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".vta").join("config.toml");
    }
    PathBuf::from("config.toml")
}
