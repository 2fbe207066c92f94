use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, VtaError};

/// Top-level configuration for the Virtual TA.
///
/// Loaded from `~/.vta/config.toml` by default. Every section falls back to
/// its defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VtaConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

impl VtaConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: VtaConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist. A file that exists but cannot be read or parsed
    /// is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(VtaError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("No config file at {}. Using defaults.", path.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        if !is_http_url(&self.completion.endpoint) {
            return Err(VtaError::Config(format!(
                "completion.endpoint must be an http(s) URL, got: {}",
                self.completion.endpoint
            )));
        }
        if self.completion.model.trim().is_empty() {
            return Err(VtaError::Config("completion.model must not be empty".into()));
        }
        if self.completion.max_tokens == 0 {
            return Err(VtaError::Config(
                "completion.max_tokens must be greater than zero".into(),
            ));
        }
        if !is_http_url(&self.knowledge.base_url) {
            return Err(VtaError::Config(format!(
                "knowledge.base_url must be an http(s) URL, got: {}",
                self.knowledge.base_url
            )));
        }
        if self.knowledge.accepted_extensions.is_empty() {
            return Err(VtaError::Config(
                "knowledge.accepted_extensions must list at least one extension".into(),
            ));
        }
        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Chat-completion endpoint settings.
///
/// The model and output limit are fixed per process; callers of the
/// completion client cannot override them per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Full URL of the OpenAI-compatible `chat/completions` route.
    pub endpoint: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Maximum number of tokens the endpoint may generate.
    pub max_tokens: u32,
    /// Request timeout. Unset means the HTTP client's own default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/v1/chat/completions".to_string(),
            model: "meta/llama-3.1-8b-instruct".to_string(),
            max_tokens: 1024,
            timeout_secs: None,
        }
    }
}

/// Knowledge-base document store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Origin serving the upload and delete routes.
    pub base_url: String,
    /// Route accepting multipart uploads.
    pub upload_path: String,
    /// Route prefix for deletes; the encoded filename is appended.
    pub delete_path: String,
    /// File extensions (without the dot) offered for upload.
    pub accepted_extensions: Vec<String>,
    /// Start sessions with knowledge-base augmentation switched on.
    pub augment_by_default: bool,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            upload_path: "/api/upload".to_string(),
            delete_path: "/api/delete".to_string(),
            accepted_extensions: vec![
                "pdf".to_string(),
                "txt".to_string(),
                "doc".to_string(),
                "docx".to_string(),
            ],
            augment_by_default: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = VtaConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(
            config.completion.endpoint,
            "http://localhost:8000/v1/chat/completions"
        );
        assert_eq!(config.completion.model, "meta/llama-3.1-8b-instruct");
        assert_eq!(config.completion.max_tokens, 1024);
        assert!(config.completion.timeout_secs.is_none());
        assert_eq!(config.knowledge.upload_path, "/api/upload");
        assert_eq!(config.knowledge.delete_path, "/api/delete");
        assert_eq!(
            config.knowledge.accepted_extensions,
            vec!["pdf", "txt", "doc", "docx"]
        );
        assert!(!config.knowledge.augment_by_default);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(VtaConfig::default().validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[completion]
endpoint = "http://gpu-box:9000/v1/chat/completions"
model = "meta/llama-3.1-70b-instruct"
max_tokens = 256
timeout_secs = 45

[knowledge]
base_url = "https://kb.example.edu"
accepted_extensions = ["pdf"]
augment_by_default = true
"#;
        let file = create_temp_config(content);
        let config = VtaConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.completion.model, "meta/llama-3.1-70b-instruct");
        assert_eq!(config.completion.max_tokens, 256);
        assert_eq!(config.completion.timeout_secs, Some(45));
        assert_eq!(config.knowledge.base_url, "https://kb.example.edu");
        assert_eq!(config.knowledge.accepted_extensions, vec!["pdf"]);
        assert!(config.knowledge.augment_by_default);
        // Unspecified keys in a present section keep their defaults.
        assert_eq!(config.knowledge.upload_path, "/api/upload");
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[general]
log_level = "warn"
"#;
        let file = create_temp_config(content);
        let config = VtaConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.completion.max_tokens, 1024);
        assert_eq!(config.knowledge.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        let file = create_temp_config("[completion\nmodel = ");
        let err = VtaConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, VtaError::Config(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config =
            VtaConfig::load_or_default(Path::new("/nonexistent/vta/config.toml")).unwrap();
        assert_eq!(config.completion.model, "meta/llama-3.1-8b-instruct");
    }

    #[test]
    fn test_load_or_default_malformed_file_is_error() {
        let file = create_temp_config("[knowledge\nbase_url = ");
        let err = VtaConfig::load_or_default(file.path()).unwrap_err();
        assert!(matches!(err, VtaError::Config(_)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = VtaConfig::default();
        config.completion.max_tokens = 512;
        config.completion.timeout_secs = Some(10);
        config.save(&path).unwrap();

        let reloaded = VtaConfig::load(&path).unwrap();
        assert_eq!(reloaded.completion.max_tokens, 512);
        assert_eq!(reloaded.completion.timeout_secs, Some(10));
        assert_eq!(reloaded.knowledge.accepted_extensions.len(), 4);
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = VtaConfig::default();
        config.completion.endpoint = "localhost:8000".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("completion.endpoint"));
    }

    #[test]
    fn test_validate_rejects_zero_max_tokens() {
        let mut config = VtaConfig::default();
        config.completion.max_tokens = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_model() {
        let mut config = VtaConfig::default();
        config.completion.model = "   ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_extensions() {
        let mut config = VtaConfig::default();
        config.knowledge.accepted_extensions.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unparseable_urls() {
        let mut config = VtaConfig::default();
        config.completion.endpoint = "http://exa mple:99999/ bad".to_string();
        assert!(config.validate().is_err());

        let mut config = VtaConfig::default();
        config.knowledge.base_url = "http://".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("knowledge.base_url"));
    }

    #[test]
    fn test_validate_rejects_bad_knowledge_url() {
        let mut config = VtaConfig::default();
        config.knowledge.base_url = "ftp://files".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("knowledge.base_url"));
    }
}
