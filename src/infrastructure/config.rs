use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::application::services::{
    ChunkingOptions, EmbeddingBatchOptions, RankingOptions, SynthesisOptions,
};

const DEFAULT_CONFIG_PATH: &str = "config/librarian.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {message}")]
    ReadError { path: PathBuf, message: String },
    #[error("Failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgresql,
    Sqlite,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(StorageBackend::Postgresql),
            "sqlite" => Ok(StorageBackend::Sqlite),
            other => Err(ConfigError::Invalid(format!("unknown database backend '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostgresSettings {
    pub url: Option<String>,
    pub pool_max: u32,
    pub pool_min: u32,
}

impl Default for PostgresSettings {
    fn default() -> Self {
        Self {
            url: None,
            pool_max: 10,
            pool_min: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteSettings {
    pub path: PathBuf,
}

impl Default for SqliteSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/library.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub backend: StorageBackend,
    pub postgresql: PostgresSettings,
    pub sqlite: SqliteSettings,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Postgresql,
            postgresql: PostgresSettings::default(),
            sqlite: SqliteSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    pub fragment_token_budget: usize,
    pub fragment_overlap: usize,
    pub min_fragment_length: usize,
    pub max_fragments_per_page: usize,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        let chunking = ChunkingOptions::default();
        Self {
            fragment_token_budget: chunking.fragment_token_budget,
            fragment_overlap: chunking.fragment_overlap,
            min_fragment_length: chunking.min_fragment_length,
            max_fragments_per_page: chunking.max_fragments_per_page,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model: String,
    pub dimensions: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
            dimensions: 1536,
            batch_size: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub chat_model: String,
    pub temperature: f32,
    pub top_k: usize,
    pub similarity_threshold: f32,
    pub max_answer_tokens: u32,
    pub include_references: bool,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            chat_model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            top_k: 5,
            similarity_threshold: 0.7,
            max_answer_tokens: 1500,
            include_references: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub documents_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            documents_ttl_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// Everything the library reads at startup. Built once in `main` and handed
/// to the container; components receive only their own options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub openai: OpenAiSettings,
    pub database: DatabaseSettings,
    pub processing: ProcessingSettings,
    pub embeddings: EmbeddingSettings,
    pub query: QuerySettings,
    pub cache: CacheSettings,
    pub server: ServerSettings,
}

impl LibraryConfig {
    /// Reads the file named by `LIBRARIAN_CONFIG` (or the default path),
    /// applies environment overrides and validates the result.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("LIBRARIAN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::from_json(&contents).map_err(|e| match e {
            ConfigError::ParseError { message, .. } => ConfigError::ParseError {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(contents).map_err(|e| ConfigError::ParseError {
            path: PathBuf::new(),
            message: e.to_string(),
        })
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.openai.api_key = key;
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.openai.base_url = url;
        }
        if let Some(backend) = lookup("DATABASE_BACKEND") {
            self.database.backend = StorageBackend::parse(&backend)?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.postgresql.url = Some(url);
        }
        if let Some(path) = lookup("SQLITE_PATH") {
            self.database.sqlite.path = PathBuf::from(path);
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT '{}' is not a port number", port)))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.openai.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "an API key is required (set OPENAI_API_KEY)".to_string(),
            ));
        }
        if self.query.top_k == 0 {
            return Err(ConfigError::Invalid("query.top_k must be at least 1".to_string()));
        }
        if self.embeddings.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "embeddings.batch_size must be at least 1".to_string(),
            ));
        }
        if self.processing.fragment_token_budget == 0 {
            return Err(ConfigError::Invalid(
                "processing.fragment_token_budget must be at least 1".to_string(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.query.similarity_threshold) {
            return Err(ConfigError::Invalid(
                "query.similarity_threshold must lie in [-1, 1]".to_string(),
            ));
        }
        if self.database.backend == StorageBackend::Postgresql
            && self.database.postgresql.url.as_deref().is_none_or(|url| url.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "the postgresql backend needs database.postgresql.url or DATABASE_URL".to_string(),
            ));
        }
        Ok(())
    }

    pub fn chunking_options(&self) -> ChunkingOptions {
        ChunkingOptions {
            fragment_token_budget: self.processing.fragment_token_budget,
            fragment_overlap: self.processing.fragment_overlap,
            min_fragment_length: self.processing.min_fragment_length,
            max_fragments_per_page: self.processing.max_fragments_per_page,
        }
    }

    pub fn embedding_options(&self) -> EmbeddingBatchOptions {
        EmbeddingBatchOptions {
            model: self.embeddings.model.clone(),
            batch_size: self.embeddings.batch_size,
        }
    }

    pub fn ranking_options(&self) -> RankingOptions {
        RankingOptions {
            threshold: self.query.similarity_threshold,
            top_k: self.query.top_k,
        }
    }

    pub fn synthesis_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            model: self.query.chat_model.clone(),
            temperature: self.query.temperature,
            max_tokens: self.query.max_answer_tokens,
            include_references: self.query.include_references,
        }
    }
}
