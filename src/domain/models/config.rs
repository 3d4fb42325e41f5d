use serde::{Deserialize, Serialize};

/// Main configuration structure for semdex
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Document store configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Vector index and snapshot configuration
    #[serde(default)]
    pub index: IndexConfig,

    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Response generation configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Rebuild behaviour
    #[serde(default)]
    pub rebuild: RebuildConfig,

    /// Search defaults
    #[serde(default)]
    pub search: SearchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".semdex/semdex.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IndexConfig {
    /// Directory holding the snapshot artifacts
    #[serde(default = "default_index_dir")]
    pub dir: String,

    /// Vector dimension; must match the embedding model
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// File name of the binary index blob
    #[serde(default = "default_index_file")]
    pub index_file: String,

    /// File name of the position-to-key mapping blob
    #[serde(default = "default_mapping_file")]
    pub mapping_file: String,
}

fn default_index_dir() -> String {
    ".semdex/index".to_string()
}

const fn default_dimension() -> usize {
    1536
}

fn default_index_file() -> String {
    "index.bin".to_string()
}

fn default_mapping_file() -> String {
    "mapping.json".to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: default_index_dir(),
            dimension: default_dimension(),
            index_file: default_index_file(),
            mapping_file: default_mapping_file(),
        }
    }
}

/// Which embedding backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// OpenAI-compatible `/embeddings` endpoint
    Openai,
    /// Deterministic local feature hashing (offline and test mode)
    Hashing,
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingConfig {
    /// Backend selection
    #[serde(default = "default_embedding_provider")]
    pub provider: EmbeddingProviderKind,

    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// API base URL
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// API key; falls back to `OPENAI_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum texts per batch request
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

const fn default_embedding_provider() -> EmbeddingProviderKind {
    EmbeddingProviderKind::Openai
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

const fn default_embedding_timeout_secs() -> u64 {
    30
}

const fn default_max_batch_size() -> usize {
    2048
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            base_url: default_openai_base_url(),
            api_key: None,
            timeout_secs: default_embedding_timeout_secs(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

/// Response generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GenerationConfig {
    /// Chat model name
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// API base URL
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// API key; falls back to `OPENAI_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Total attempts before giving up
    #[serde(default = "default_generation_retries")]
    pub max_retries: u32,

    /// Delay between attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_generation_model() -> String {
    "gpt-3.5-turbo".to_string()
}

const fn default_temperature() -> f32 {
    0.7
}

const fn default_generation_retries() -> u32 {
    3
}

const fn default_retry_delay_ms() -> u64 {
    1000
}

const fn default_generation_timeout_secs() -> u64 {
    60
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_generation_model(),
            base_url: default_openai_base_url(),
            api_key: None,
            temperature: default_temperature(),
            max_retries: default_generation_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

/// Rebuild configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RebuildConfig {
    /// Documents embedded per provider batch call
    #[serde(default = "default_rebuild_batch_size")]
    pub batch_size: usize,

    /// Abort the rebuild after this many seconds (unbounded when unset)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Log progress every N processed documents
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
}

const fn default_rebuild_batch_size() -> usize {
    32
}

const fn default_progress_interval() -> usize {
    10
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            batch_size: default_rebuild_batch_size(),
            timeout_secs: None,
            progress_interval: default_progress_interval(),
        }
    }
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SearchConfig {
    /// Neighbours requested when the caller does not specify k
    #[serde(default = "default_k")]
    pub default_k: usize,
}

const fn default_k() -> usize {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { default_k: default_k() }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
