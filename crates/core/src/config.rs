//! Configuration management for lorebase.
//!
//! Configuration is merged from multiple sources, later sources winning:
//! - Built-in defaults
//! - Config file (`lorebase.yaml` next to the knowledge directory, or
//!   an explicit `--config` path)
//! - Environment variables
//! - Command-line flags

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
///
/// Holds the global options that affect behavior across commands: where
/// the document directory lives, how documents are chunked, how many
/// results retrieval returns, and which LLM provider answers chat turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the knowledge base documents
    pub kb_dir: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Chunk size in words
    pub chunk_size: usize,

    /// Overlap between consecutive chunks, in words
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per query
    pub top_k: usize,

    /// LLM provider identifier (e.g., "openrouter")
    pub provider: String,

    /// Model identifier passed to the provider
    pub model: String,

    /// Optional custom provider endpoint
    pub endpoint: Option<String>,

    /// API key for the LLM provider
    pub api_key: Option<String>,

    /// Path to the chat history database
    pub history_db: PathBuf,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    knowledge: Option<KnowledgeSection>,
    llm: Option<LlmSection>,
    chat: Option<ChatSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct KnowledgeSection {
    dir: Option<String>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    top_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatSection {
    history_db: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            kb_dir: PathBuf::from("knowledge_base"),
            config_file: None,
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 3,
            provider: "openrouter".to_string(),
            model: "openai/gpt-oss-20b:free".to_string(),
            endpoint: None,
            api_key: None,
            history_db: PathBuf::from(".lorebase/history.sqlite"),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// Environment variables:
    /// - `LOREBASE_KB_DIR`: Knowledge base directory
    /// - `LOREBASE_CONFIG`: Path to config file
    /// - `LOREBASE_PROVIDER`: LLM provider
    /// - `LOREBASE_MODEL`: Model identifier
    /// - `LOREBASE_ENDPOINT`: Custom provider endpoint
    /// - `LOREBASE_HISTORY_DB`: Chat history database path
    /// - `OPENROUTER_API_KEY` / `LOREBASE_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(kb_dir) = std::env::var("LOREBASE_KB_DIR") {
            config.kb_dir = PathBuf::from(kb_dir);
        }

        if let Ok(config_file) = std::env::var("LOREBASE_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        // Merge the YAML config file if one exists
        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            PathBuf::from("lorebase.yaml")
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("LOREBASE_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("LOREBASE_MODEL") {
            config.model = model;
        }

        if let Ok(endpoint) = std::env::var("LOREBASE_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }

        if let Ok(history_db) = std::env::var("LOREBASE_HISTORY_DB") {
            config.history_db = PathBuf::from(history_db);
        }

        config.api_key = std::env::var("LOREBASE_API_KEY")
            .or_else(|_| std::env::var("OPENROUTER_API_KEY"))
            .ok();
        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(knowledge) = config_file.knowledge {
            if let Some(dir) = knowledge.dir {
                result.kb_dir = PathBuf::from(dir);
            }
            if let Some(chunk_size) = knowledge.chunk_size {
                result.chunk_size = chunk_size;
            }
            if let Some(chunk_overlap) = knowledge.chunk_overlap {
                result.chunk_overlap = chunk_overlap;
            }
            if let Some(top_k) = knowledge.top_k {
                result.top_k = top_k;
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if let Some(endpoint) = llm.endpoint {
                result.endpoint = Some(endpoint);
            }
            if let Some(api_key_env) = llm.api_key_env {
                if let Ok(key) = std::env::var(&api_key_env) {
                    result.api_key = Some(key);
                }
            }
        }

        if let Some(chat) = config_file.chat {
            if let Some(history_db) = chat.history_db {
                result.history_db = PathBuf::from(history_db);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over both the config file and
    /// environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        kb_dir: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(kb_dir) = kb_dir {
            self.kb_dir = kb_dir;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Ensure the directory holding the chat history database exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        if let Some(parent) = self.history_db.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Config(format!("Failed to create state directory: {}", e))
                })?;
            }
        }
        Ok(())
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["openrouter"];

        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if self.chunk_size == 0 {
            return Err(AppError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
