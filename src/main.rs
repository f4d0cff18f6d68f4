mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chlix_index::{ChunkerConfig, IndexError, IndexerConfig};
use chlix_store::{DocumentStore, OllamaEmbedder, QdrantDocumentStore, StoreError};
use clap::{Parser, Subcommand};

use crate::config::{Config, resolve_config_path};

#[derive(Parser, Debug)]
#[command(name = "chlix")]
#[command(about = "Index a codebase into a vector store and search it semantically", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to a TOML config file (default: $CHLIX_CONFIG or config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index a codebase
    Index {
        /// Path to the codebase
        path: PathBuf,
        /// Collection name (default: the directory name)
        #[arg(long)]
        collection: Option<String>,
        /// Maximum characters per chunk
        #[arg(long)]
        chunk_size: Option<usize>,
    },
    /// Search the indexed codebase
    Search {
        collection: String,
        query: String,
        /// Number of results
        #[arg(long)]
        n_results: Option<usize>,
        /// Only return chunks of this type, e.g. `rs` or `.py`
        #[arg(long)]
        file_type: Option<String>,
    },
    /// Print a token-budgeted context block for a query
    Context {
        collection: String,
        query: String,
        #[arg(long)]
        n_results: Option<usize>,
        /// Estimated token budget for the assembled block
        #[arg(long)]
        max_tokens: Option<usize>,
    },
    /// Print every indexed chunk of one file in line order
    File {
        collection: String,
        /// Path relative to the indexed root, e.g. `src/main.rs`
        path: String,
    },
    /// List all collections
    List,
    /// Get info about a collection
    Info { collection: String },
    /// Delete a collection
    Delete {
        collection: String,
        /// Confirm deletion
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_subscriber();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if let Some(hint) = remediation_hint(&e) {
                eprintln!("{hint}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = resolve_config_path(cli.config.as_deref());
    let config = Config::load(&config_path)?;
    config.validate()?;
    tracing::debug!(path = %config_path.display(), "configuration loaded");

    let store = connect(&config)?;
    let mut out = std::io::stdout().lock();
    dispatch(&mut out, store, &config, cli.command).await
}

async fn dispatch(
    out: &mut dyn std::io::Write,
    store: Arc<dyn DocumentStore>,
    config: &Config,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::Index {
            path,
            collection,
            chunk_size,
        } => {
            let chunk_size = chunk_size.unwrap_or(config.index.chunk_size);
            if chunk_size == 0 {
                anyhow::bail!("--chunk-size must be greater than 0");
            }
            let indexer_config = IndexerConfig {
                chunker: ChunkerConfig { chunk_size },
                respect_gitignore: config.index.respect_gitignore,
            };
            commands::index(out, store, &path, collection.as_deref(), indexer_config).await
        }
        Command::Search {
            collection,
            query,
            n_results,
            file_type,
        } => {
            let n = result_count(n_results, config)?;
            commands::search(out, store, &collection, &query, n, file_type.as_deref()).await
        }
        Command::Context {
            collection,
            query,
            n_results,
            max_tokens,
        } => {
            let n = result_count(n_results, config)?;
            let budget = max_tokens.unwrap_or(config.search.max_tokens);
            commands::context(out, store, &collection, &query, n, budget).await
        }
        Command::File { collection, path } => commands::file(out, store, &collection, &path).await,
        Command::List => commands::list(out, store).await,
        Command::Info { collection } => commands::info(out, store, &collection).await,
        Command::Delete {
            collection,
            confirm,
        } => commands::delete(out, store, &collection, confirm).await,
    }
}

fn result_count(flag: Option<usize>, config: &Config) -> anyhow::Result<usize> {
    let n = flag.unwrap_or(config.search.n_results);
    if n == 0 {
        anyhow::bail!("--n-results must be greater than 0");
    }
    Ok(n)
}

fn connect(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let embedder = OllamaEmbedder::new(&config.embedding.base_url, config.embedding.model.clone());
    tracing::debug!(
        qdrant = %config.store.qdrant_url,
        ollama = %config.embedding.base_url,
        model = embedder.model(),
        "backends configured"
    );
    let store = QdrantDocumentStore::new(&config.store.qdrant_url, embedder)?;
    Ok(Arc::new(store))
}

fn remediation_hint(err: &anyhow::Error) -> Option<&'static str> {
    let (not_found, connection) = err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<IndexError>() {
            Some((e.is_not_found(), e.is_connection()))
        } else {
            cause
                .downcast_ref::<StoreError>()
                .map(|e| (e.is_not_found(), e.is_connection()))
        }
    })?;
    if not_found {
        Some("List available collections with: chlix list")
    } else if connection {
        Some(
            "Make sure Qdrant and Ollama are running and reachable \
             (see store.qdrant_url and embedding.base_url)",
        )
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_index_with_overrides() {
        let cli = Cli::try_parse_from([
            "chlix",
            "index",
            "./repo",
            "--collection",
            "mine",
            "--chunk-size",
            "200",
        ])
        .unwrap();
        match cli.command {
            Command::Index {
                path,
                collection,
                chunk_size,
            } => {
                assert_eq!(path, PathBuf::from("./repo"));
                assert_eq!(collection.as_deref(), Some("mine"));
                assert_eq!(chunk_size, Some(200));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_search_defaults_to_config() {
        let cli = Cli::try_parse_from(["chlix", "search", "repo", "where is auth"]).unwrap();
        match cli.command {
            Command::Search {
                collection,
                query,
                n_results,
                file_type,
            } => {
                assert_eq!(collection, "repo");
                assert_eq!(query, "where is auth");
                assert!(n_results.is_none());
                assert!(file_type.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_search_flags() {
        let cli = Cli::try_parse_from([
            "chlix",
            "search",
            "repo",
            "q",
            "--n-results",
            "3",
            "--file-type",
            "rs",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Search { n_results: Some(3), file_type: Some(ref t), .. } if t == "rs"
        ));
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["chlix", "list", "--config", "alt.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        assert!(matches!(cli.command, Command::List));
    }

    #[test]
    fn parse_delete_confirm() {
        let cli = Cli::try_parse_from(["chlix", "delete", "repo"]).unwrap();
        assert!(matches!(cli.command, Command::Delete { confirm: false, .. }));
        let cli = Cli::try_parse_from(["chlix", "delete", "repo", "--confirm"]).unwrap();
        assert!(matches!(cli.command, Command::Delete { confirm: true, .. }));
    }

    #[test]
    fn parse_context_and_file() {
        let cli =
            Cli::try_parse_from(["chlix", "context", "repo", "q", "--max-tokens", "500"]).unwrap();
        assert!(matches!(cli.command, Command::Context { max_tokens: Some(500), .. }));

        let cli = Cli::try_parse_from(["chlix", "file", "repo", "src/lib.rs"]).unwrap();
        assert!(matches!(cli.command, Command::File { ref path, .. } if path == "src/lib.rs"));
    }

    #[test]
    fn zero_result_count_is_rejected() {
        let config = Config::default();
        let err = result_count(Some(0), &config).unwrap_err();
        assert!(err.to_string().contains("--n-results"));
        assert_eq!(result_count(None, &config).unwrap(), config.search.n_results);
        assert_eq!(result_count(Some(3), &config).unwrap(), 3);
    }

    #[tokio::test]
    async fn search_with_zero_results_fails_before_querying() {
        let store: Arc<dyn DocumentStore> = Arc::new(chlix_store::InMemoryDocumentStore::new(
            chlix_store::MockEmbedder::default(),
        ));
        let command = Command::Search {
            collection: "missing".into(),
            query: "q".into(),
            n_results: Some(0),
            file_type: None,
        };
        let mut out = Vec::new();
        let err = dispatch(&mut out, store, &Config::default(), command)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--n-results"));
        assert!(out.is_empty());
    }

    #[test]
    fn missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["chlix"]).is_err());
    }

    #[test]
    fn hint_for_missing_collection() {
        let err = anyhow::Error::from(StoreError::CollectionNotFound("ghost".into()));
        assert_eq!(
            remediation_hint(&err),
            Some("List available collections with: chlix list")
        );
    }

    #[test]
    fn hint_sees_through_context() {
        let err = Err::<(), _>(IndexError::from(StoreError::Connection("refused".into())))
            .context("indexing ./repo failed")
            .unwrap_err();
        assert!(remediation_hint(&err).is_some_and(|h| h.contains("Qdrant")));
    }

    #[test]
    fn no_hint_for_plain_errors() {
        let err = anyhow::anyhow!("path does not exist: /x");
        assert!(remediation_hint(&err).is_none());
    }
}
