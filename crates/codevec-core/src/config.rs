//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g. `APP_STORE__URI`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::chunker::{Chunker, DEFAULT_MAX_SIZE, DEFAULT_OVERLAP};
use crate::source::DEFAULT_EXTENSIONS;
use crate::types::Distance;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub embedding: EmbeddingSettings,
    pub store: StoreSettings,
    pub chunking: ChunkingSettings,
    pub source: SourceSettings,
    pub query: QuerySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// `openai` or `fake`.
    pub provider: String,
    pub model: String,
    pub dimension: usize,
    pub base_url: String,
    /// Empty means "read `OPENAI_API_KEY`".
    pub api_key: String,
    pub timeout_secs: u64,
    /// Upper bound on in-flight embedding calls for one file.
    pub max_concurrency: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-ada-002".to_string(),
            dimension: 1536,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
            max_concurrency: 8,
        }
    }
}

impl EmbeddingSettings {
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.is_empty() {
            return Some(self.api_key.clone());
        }
        env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// `lance` or `memory`.
    pub backend: String,
    pub uri: String,
    pub collection: String,
    pub distance: Distance,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: "lance".to_string(),
            uri: "./data/lancedb".to_string(),
            collection: "code_embeddings".to_string(),
            distance: Distance::Cosine,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub max_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self { Self { max_size: DEFAULT_MAX_SIZE, overlap: DEFAULT_OVERLAP } }
}

impl ChunkingSettings {
    pub fn chunker(&self) -> Result<Chunker, crate::error::ChunkingError> { Chunker::new(self.max_size, self.overlap) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub root: String,
    pub extensions: Vec<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self { root: "example/src".to_string(), extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub example: String,
    pub limit: usize,
}

impl Default for QuerySettings {
    fn default() -> Self { Self { example: "What task categories are there?".to_string(), limit: 5 } }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment.extract().map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))
    }
}

impl Settings {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.chunking.chunker()?;
        if self.embedding.dimension == 0 {
            anyhow::bail!("embedding.dimension must be greater than zero");
        }
        if self.embedding.max_concurrency == 0 {
            anyhow::bail!("embedding.max_concurrency must be greater than zero");
        }
        if self.store.collection.trim().is_empty() {
            anyhow::bail!("store.collection must not be empty");
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
