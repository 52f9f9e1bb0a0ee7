use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RcaBotError, Result};

pub const DEFAULT_KNOWLEDGE_BASE_DIR: &str = "./vector_data_openAI";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a Bot used to answer System and Server Incident root cause. Answer the user's questions based on the below context:\n\n{context}";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub knowledge_base_dir: PathBuf,
    pub provider: ProviderConfig,
    pub embedding: EmbeddingConfig,
    pub chat: ChatConfig,
    pub splitter: SplitterConfig,
    pub retrieval: RetrievalConfig,
    pub fetch: FetchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            knowledge_base_dir: PathBuf::from(DEFAULT_KNOWLEDGE_BASE_DIR),
            provider: ProviderConfig::default(),
            embedding: EmbeddingConfig::default(),
            chat: ChatConfig::default(),
            splitter: SplitterConfig::default(),
            retrieval: RetrievalConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

/// OpenAI-compatible API endpoint shared by the embedding and chat clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    #[default]
    OpenAi,
    FastEmbed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub model: String,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::OpenAi,
            model: "text-embedding-ada-002".to_string(),
            batch_size: 64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub model: String,
    pub rewrite_temperature: f32,
    pub answer_temperature: f32,
    /// `{context}` is replaced with the retrieved chunks.
    pub system_prompt: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            rewrite_temperature: 0.7,
            answer_temperature: 0.7,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4000,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval always ranks by cosine similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("rca-bot/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project()?;
        let merged = Self::merge(global, project);
        let config = merged.with_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn load_global() -> Result<Option<Self>> {
        let config_dir = directories::ProjectDirs::from("", "", "rca-bot").map_or_else(
            || PathBuf::from("~/.config/rca-bot"),
            |d| d.config_dir().to_path_buf(),
        );

        Self::load_file(&config_dir.join("config.toml"))
    }

    fn load_project() -> Result<Option<Self>> {
        Self::load_file(Path::new(".rca-bot/config.toml"))
    }

    fn load_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)
            .map_err(|e| RcaBotError::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(Some(config))
    }

    fn merge(global: Option<Self>, project: Option<Self>) -> Self {
        match (global, project) {
            (Some(global), Some(mut project)) => {
                project.provider.api_key = project.provider.api_key.or(global.provider.api_key);
                project
            }
            (Some(only), None) | (None, Some(only)) => only,
            (None, None) => Self::default(),
        }
    }

    fn with_env_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = var("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.provider.api_key = Some(key);
        }
        if let Some(base_url) = var("OPENAI_BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.provider.base_url = base_url;
        }
        if let Some(dir) = var("RCA_BOT_KB_DIR").filter(|d| !d.trim().is_empty()) {
            self.knowledge_base_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.splitter.chunk_size == 0 {
            return Err(RcaBotError::Config(
                "splitter.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.splitter.chunk_overlap >= self.splitter.chunk_size {
            return Err(RcaBotError::Config(format!(
                "splitter.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.splitter.chunk_overlap, self.splitter.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(RcaBotError::Config(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(RcaBotError::Config(
                "embedding.batch_size must be at least 1".to_string(),
            ));
        }
        if self.knowledge_base_dir.as_os_str().is_empty() {
            return Err(RcaBotError::Config(
                "knowledge_base_dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The API key, or a configuration error naming where to set it.
    pub fn require_api_key(&self) -> Result<&str> {
        self.provider
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                RcaBotError::Config(
                    "OPENAI_API_KEY is not set (environment, .env, or provider.api_key)"
                        .to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.knowledge_base_dir, PathBuf::from("./vector_data_openAI"));
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.splitter.chunk_size, 4000);
        assert_eq!(config.splitter.chunk_overlap, 200);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
knowledge_base_dir = "/tmp/kb"

[retrieval]
top_k = 8
"#,
        )
        .unwrap();

        assert_eq!(config.knowledge_base_dir, PathBuf::from("/tmp/kb"));
        assert_eq!(config.retrieval.top_k, 8);
        assert_eq!(config.chat.model, "gpt-3.5-turbo");
        assert_eq!(config.embedding.backend, EmbeddingBackend::OpenAi);
    }

    #[test]
    fn backend_parses_lowercase() {
        let config: Config = toml::from_str("[embedding]\nbackend = \"fastembed\"\n").unwrap();
        assert_eq!(config.embedding.backend, EmbeddingBackend::FastEmbed);
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let mut config = Config::default();
        config.splitter.chunk_overlap = config.splitter.chunk_size;
        assert!(matches!(config.validate(), Err(RcaBotError::Config(_))));
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let mut config = Config::default();
        config.retrieval.top_k = 0;
        assert!(matches!(config.validate(), Err(RcaBotError::Config(_))));
    }

    #[test]
    fn project_wins_but_inherits_global_key() {
        let mut global = Config::default();
        global.provider.api_key = Some("sk-global".to_string());
        global.retrieval.top_k = 2;

        let mut project = Config::default();
        project.retrieval.top_k = 6;

        let merged = Config::merge(Some(global), Some(project));
        assert_eq!(merged.retrieval.top_k, 6);
        assert_eq!(merged.provider.api_key.as_deref(), Some("sk-global"));
    }

    #[test]
    fn env_overrides_apply_and_ignore_blanks() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("OPENAI_API_KEY", "sk-env"),
            ("OPENAI_BASE_URL", "  "),
            ("RCA_BOT_KB_DIR", "/data/kb"),
        ]);

        let config = Config::default()
            .with_env_overrides(|key| env.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.provider.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.provider.base_url, "https://api.openai.com/v1");
        assert_eq!(config.knowledge_base_dir, PathBuf::from("/data/kb"));
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let config = Config::default();
        assert!(matches!(config.require_api_key(), Err(RcaBotError::Config(_))));
    }
}
