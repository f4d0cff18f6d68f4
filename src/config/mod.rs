mod env;
mod types;


pub use types::*;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error if a size setting is zero.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.index.chunk_size == 0 {
            bail!("index.chunk_size must be greater than 0");
        }
        if self.search.n_results == 0 {
            bail!("search.n_results must be greater than 0");
        }
        Ok(())
    }
}

/// Config file location: `--config`, then `CHLIX_CONFIG`, then `config/default.toml`.
pub fn resolve_config_path(cli_override: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_override {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("CHLIX_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}
