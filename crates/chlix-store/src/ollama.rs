use ollama_rs::Ollama;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};

use crate::embedding::Embedder;
use crate::error::StoreError;

const DEFAULT_PORT: u16 = 11434;

/// Embedder backed by an Ollama server's embeddings endpoint.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: Ollama,
    model: String,
}

impl OllamaEmbedder {
    #[must_use]
    pub fn new(base_url: &str, model: String) -> Self {
        let (host, port) = parse_host_port(base_url);
        Self {
            client: Ollama::new(host, port),
            model,
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, StoreError> {
        let request =
            GenerateEmbeddingsRequest::new(self.model.clone(), EmbeddingsInput::from(text));

        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(|e| StoreError::Connection(format!("Ollama embedding request failed: {e}")))?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Embedding(format!("empty embedding from {}", self.model)))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ollama"
    }
}

fn parse_host_port(base_url: &str) -> (String, u16) {
    let trimmed = base_url.trim_end_matches('/');
    trimmed
        .rsplit_once(':')
        .and_then(|(host, port)| Some((host.to_owned(), port.parse().ok()?)))
        .unwrap_or_else(|| (trimmed.to_owned(), DEFAULT_PORT))
}
