use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CHLIX_QDRANT_URL") {
            self.store.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("CHLIX_OLLAMA_URL") {
            self.embedding.base_url = v;
        }
        if let Ok(v) = std::env::var("CHLIX_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("CHLIX_CHUNK_SIZE") {
            if let Ok(size) = v.parse::<usize>() {
                self.index.chunk_size = size;
            } else {
                tracing::warn!("ignoring invalid CHLIX_CHUNK_SIZE value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CHLIX_RESPECT_GITIGNORE") {
            if let Ok(respect) = v.parse::<bool>() {
                self.index.respect_gitignore = respect;
            } else {
                tracing::warn!("ignoring invalid CHLIX_RESPECT_GITIGNORE value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CHLIX_N_RESULTS") {
            if let Ok(n) = v.parse::<usize>() {
                self.search.n_results = n;
            } else {
                tracing::warn!("ignoring invalid CHLIX_N_RESULTS value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CHLIX_MAX_TOKENS") {
            if let Ok(tokens) = v.parse::<usize>() {
                self.search.max_tokens = tokens;
            } else {
                tracing::warn!("ignoring invalid CHLIX_MAX_TOKENS value: {v}");
            }
        }
    }
}
