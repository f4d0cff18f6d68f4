//! Project indexing orchestrator: walk → select → chunk → identify → store.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chlix_store::{Document, DocumentStore};
use serde::Serialize;

use crate::chunker::{Chunk, ChunkerConfig, chunk_text};
use crate::error::{IndexError, Result};
use crate::selector::{file_type, is_excluded_dir, is_indexable};

/// Indexer configuration.
#[derive(Debug, Clone, Default)]
pub struct IndexerConfig {
    pub chunker: ChunkerConfig,
    /// Skip files matched by `.gitignore` rules in addition to the fixed exclusions.
    pub respect_gitignore: bool,
}

/// Why a file was passed over without submitting anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// Empty or whitespace-only content.
    Empty,
}

/// A file that could not be read or submitted.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: String,
    pub error: String,
}

/// Result of indexing one file.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Indexed { chunks: usize },
    Skipped(SkipReason),
    Failed(FileFailure),
}

/// Summary of an indexing run.
#[derive(Debug, Default, Serialize)]
pub struct IndexReport {
    pub collection: String,
    /// Files accepted by the selector.
    pub files_visited: usize,
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub chunks_submitted: usize,
    /// Documents in the collection after the run, as reported by the store.
    pub total_chunks: u64,
    /// Directory entries the walker could not read.
    pub walk_errors: usize,
    pub failures: Vec<FileFailure>,
    pub duration_ms: u64,
}

impl IndexReport {
    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Indexed { chunks } => {
                self.files_indexed += 1;
                self.chunks_submitted += chunks;
            }
            FileOutcome::Skipped(_) => self.files_skipped += 1,
            FileOutcome::Failed(failure) => {
                self.files_failed += 1;
                self.failures.push(failure);
            }
        }
    }
}

/// Document count of one collection.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionStats {
    pub name: String,
    pub total_chunks: u64,
}

/// Orchestrates code indexing over a project tree.
pub struct CodeIndexer {
    store: Arc<dyn DocumentStore>,
    config: IndexerConfig,
}

impl CodeIndexer {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, config: IndexerConfig) -> Self {
        Self { store, config }
    }

    /// Index every eligible file under `root` into `collection`.
    ///
    /// Per-file read and submission failures are recorded in the report and
    /// the walk continues.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not a directory, or if the collection
    /// cannot be created or counted.
    pub async fn index_directory(&self, root: &Path, collection: &str) -> Result<IndexReport> {
        let start = std::time::Instant::now();
        check_root(root)?;

        self.store.get_or_create_collection(collection).await?;

        let mut report = IndexReport {
            collection: collection.to_owned(),
            ..IndexReport::default()
        };

        let entries = self.eligible_files(root, &mut report);
        let total = entries.len();
        tracing::info!(root = %root.display(), collection, total, "indexing started");

        for (i, (abs_path, rel_path)) in entries.iter().enumerate() {
            report.files_visited += 1;
            let outcome = self.index_one(abs_path, rel_path, collection).await;
            match &outcome {
                FileOutcome::Indexed { chunks } => tracing::info!(
                    file = %rel_path,
                    progress = format_args!("{}/{total}", i + 1),
                    chunks,
                    "indexed"
                ),
                FileOutcome::Skipped(reason) => {
                    tracing::debug!(file = %rel_path, ?reason, "skipped");
                }
                FileOutcome::Failed(failure) => {
                    tracing::warn!(file = %rel_path, "indexing failed: {}", failure.error);
                }
            }
            report.record(outcome);
        }

        report.total_chunks = self.store.count(collection).await?;
        report.duration_ms = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);

        tracing::info!(
            collection,
            files = report.files_indexed,
            chunks = report.chunks_submitted,
            failed = report.files_failed,
            total_chunks = report.total_chunks,
            "indexing complete"
        );
        Ok(report)
    }

    /// Index a single file under `root` into an existing collection.
    pub async fn index_file(&self, root: &Path, abs_path: &Path, collection: &str) -> FileOutcome {
        let rel_path = relative_path(root, abs_path);
        self.index_one(abs_path, &rel_path, collection).await
    }

    /// Current document count of `collection`.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection does not exist or the store is unreachable.
    pub async fn stats(&self, collection: &str) -> Result<CollectionStats> {
        let total_chunks = self.store.count(collection).await?;
        Ok(CollectionStats {
            name: collection.to_owned(),
            total_chunks,
        })
    }

    /// Walk `root`, pruning excluded directories before descent, and return
    /// `(absolute, relative)` paths of files the selector accepts.
    fn eligible_files(&self, root: &Path, report: &mut IndexReport) -> Vec<(PathBuf, String)> {
        let respect = self.config.respect_gitignore;
        let walker = ignore::WalkBuilder::new(root)
            .hidden(false)
            .ignore(false)
            .parents(respect)
            .git_ignore(respect)
            .git_exclude(respect)
            .git_global(false)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(|entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                !(is_dir && entry.depth() > 0 && entry.file_name().to_str().is_some_and(is_excluded_dir))
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("walk error: {e}");
                    report.walk_errors += 1;
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let rel_path = relative_path(root, entry.path());
            if is_indexable(Path::new(&rel_path)) {
                files.push((entry.into_path(), rel_path));
            }
        }
        files
    }

    async fn index_one(&self, abs_path: &Path, rel_path: &str, collection: &str) -> FileOutcome {
        let bytes = match tokio::fs::read(abs_path).await {
            Ok(bytes) => bytes,
            Err(e) => return failed(rel_path, &IndexError::Io(e)),
        };
        let source = String::from_utf8_lossy(&bytes);
        if source.trim().is_empty() {
            return FileOutcome::Skipped(SkipReason::Empty);
        }

        let tag = file_type(abs_path).unwrap_or_default();
        let documents: Vec<Document> = chunk_text(&source, rel_path, tag, &self.config.chunker)
            .into_iter()
            .map(chunk_to_document)
            .collect();
        let chunks = documents.len();

        match self.store.add_documents(collection, documents).await {
            Ok(()) => FileOutcome::Indexed { chunks },
            Err(e) => failed(rel_path, &IndexError::Store(e)),
        }
    }
}

fn failed(rel_path: &str, error: &IndexError) -> FileOutcome {
    FileOutcome::Failed(FileFailure {
        path: rel_path.to_owned(),
        error: error.to_string(),
    })
}

fn check_root(root: &Path) -> Result<()> {
    let reason = if !root.exists() {
        "path does not exist"
    } else if !root.is_dir() {
        "path is not a directory"
    } else {
        return Ok(());
    };
    Err(IndexError::InvalidRoot {
        path: root.display().to_string(),
        reason,
    })
}

fn chunk_to_document(chunk: Chunk) -> Document {
    let id = chunk.id();
    let metadata = HashMap::from([
        ("file_path".to_owned(), serde_json::json!(chunk.file_path)),
        ("start_line".to_owned(), serde_json::json!(chunk.start_line)),
        ("end_line".to_owned(), serde_json::json!(chunk.end_line)),
        ("file_type".to_owned(), serde_json::json!(chunk.file_type)),
    ]);
    Document {
        id,
        text: chunk.text,
        metadata,
    }
}

/// `path` relative to `root`, joined with `/` on every platform.
#[must_use]
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Collection name for a repository path: its final component.
///
/// The path is canonicalised first when possible so `.` or `repo/` resolve
/// to the directory's real name.
#[must_use]
pub fn collection_name_for(path: &Path) -> Option<String> {
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}
