use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".into()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".into()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".into()
}

fn default_chunk_size() -> usize {
    1000
}

fn default_n_results() -> usize {
    5
}

fn default_max_tokens() -> usize {
    4000
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            qdrant_url: default_qdrant_url(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Ollama endpoint used to embed chunks and queries.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            model: default_embedding_model(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct IndexConfig {
    /// Character budget per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub respect_gitignore: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            respect_gitignore: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SearchConfig {
    #[serde(default = "default_n_results")]
    pub n_results: usize,
    /// Token budget for `chlix context`.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_results: default_n_results(),
            max_tokens: default_max_tokens(),
        }
    }
}
