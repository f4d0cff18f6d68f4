use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chlix_index::{CodeIndexer, CodeRetriever, IndexReport, IndexerConfig, collection_name_for};
use chlix_store::DocumentStore;

const RULE_WIDTH: usize = 80;

pub async fn index(
    out: &mut dyn Write,
    store: Arc<dyn DocumentStore>,
    path: &Path,
    collection: Option<&str>,
    config: IndexerConfig,
) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("path does not exist: {}", path.display());
    }
    if !path.is_dir() {
        anyhow::bail!("path is not a directory: {}", path.display());
    }
    let collection = match collection {
        Some(name) => name.to_owned(),
        None => collection_name_for(path)
            .with_context(|| format!("cannot derive a collection name from {}", path.display()))?,
    };

    writeln!(out, "Repository: {}", path.display())?;
    writeln!(out, "Collection: {collection}")?;
    writeln!(out)?;

    let indexer = CodeIndexer::new(store, config);
    let report = indexer
        .index_directory(path, &collection)
        .await
        .with_context(|| format!("indexing {} failed", path.display()))?;
    write_report(out, &report)?;
    if report.files_indexed == 0 && report.files_failed > 0 {
        anyhow::bail!(
            "no files were indexed into '{collection}' ({} failed)",
            report.files_failed
        );
    }
    Ok(())
}

fn write_report(out: &mut dyn Write, report: &IndexReport) -> std::io::Result<()> {
    writeln!(
        out,
        "Indexed {} of {} files ({} chunks) in {} ms",
        report.files_indexed, report.files_visited, report.chunks_submitted, report.duration_ms
    )?;
    if report.files_skipped > 0 {
        writeln!(out, "Skipped {} empty files", report.files_skipped)?;
    }
    if !report.failures.is_empty() {
        writeln!(out, "Failed {} files:", report.files_failed)?;
        for failure in &report.failures {
            writeln!(out, "  {}: {}", failure.path, failure.error)?;
        }
    }
    writeln!(out)?;
    writeln!(out, "Collection Name: {}", report.collection)?;
    writeln!(out, "Total Chunks: {}", report.total_chunks)?;
    if report.files_indexed > 0 || report.files_failed == 0 {
        writeln!(out, "Successfully indexed '{}'", report.collection)?;
    }
    Ok(())
}

pub async fn search(
    out: &mut dyn Write,
    store: Arc<dyn DocumentStore>,
    collection: &str,
    query: &str,
    n_results: usize,
    file_type: Option<&str>,
) -> anyhow::Result<()> {
    let retriever = CodeRetriever::new(store, collection);
    let file_type = file_type.map(normalize_file_type);
    let results = retriever.search(query, n_results, file_type.as_deref()).await?;

    if results.is_empty() {
        writeln!(out, "No results found for: {query}")?;
        return Ok(());
    }

    writeln!(out, "Found {} results for: {query}\n", results.len())?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    for (i, result) in results.iter().enumerate() {
        writeln!(out, "\nResult {}: {}", i + 1, result.file_path)?;
        writeln!(out, "Lines {}-{}", result.start_line, result.end_line)?;
        if let Some(score) = result.relevance_score {
            writeln!(out, "Relevance: {score:.2}")?;
        }
        writeln!(out)?;
        writeln!(out, "{}", result.content)?;
        writeln!(out, "\n{}", "-".repeat(RULE_WIDTH))?;
    }
    Ok(())
}

/// Accept `rs` as well as `.rs` for the type filter.
fn normalize_file_type(raw: &str) -> String {
    if raw.starts_with('.') {
        raw.to_owned()
    } else {
        format!(".{raw}")
    }
}

pub async fn context(
    out: &mut dyn Write,
    store: Arc<dyn DocumentStore>,
    collection: &str,
    query: &str,
    n_results: usize,
    max_tokens: usize,
) -> anyhow::Result<()> {
    let retriever = CodeRetriever::new(store, collection);
    let window = retriever.assemble_context(query, n_results, max_tokens).await?;
    tracing::info!(
        entries = window.entries.len(),
        estimated_tokens = window.estimated_tokens,
        "context assembled"
    );
    write!(out, "{}", window.text)?;
    Ok(())
}

pub async fn file(
    out: &mut dyn Write,
    store: Arc<dyn DocumentStore>,
    collection: &str,
    file_path: &str,
) -> anyhow::Result<()> {
    let retriever = CodeRetriever::new(store, collection);
    let chunks = retriever.search_by_file(file_path).await?;

    if chunks.is_empty() {
        writeln!(out, "No chunks found for file: {file_path}")?;
        return Ok(());
    }

    writeln!(out, "{file_path} ({} chunks)", chunks.len())?;
    for chunk in &chunks {
        writeln!(out, "\n--- Lines {}-{} ---", chunk.start_line, chunk.end_line)?;
        writeln!(out, "{}", chunk.content)?;
    }
    Ok(())
}

pub async fn list(out: &mut dyn Write, store: Arc<dyn DocumentStore>) -> anyhow::Result<()> {
    let collections = store.list_collections().await?;

    if collections.is_empty() {
        writeln!(out, "No collections found.")?;
        writeln!(out, "Index a codebase with: chlix index /path/to/repo")?;
        return Ok(());
    }

    writeln!(out, "Available collections ({}):\n", collections.len())?;
    for (name, count) in &collections {
        writeln!(out, "  - {name} ({count} chunks)")?;
    }
    Ok(())
}

pub async fn info(
    out: &mut dyn Write,
    store: Arc<dyn DocumentStore>,
    collection: &str,
) -> anyhow::Result<()> {
    let info = store.collection_info(collection).await?;

    writeln!(out, "Collection: {}", info.name)?;
    writeln!(out, "Total chunks: {}", info.count)?;

    if let Some(sample) = info.sample_metadata {
        writeln!(out, "\nSample metadata:")?;
        let sorted: BTreeMap<_, _> = sample.into_iter().collect();
        for (key, value) in sorted {
            match value {
                serde_json::Value::String(s) => writeln!(out, "  {key}: {s}")?,
                other => writeln!(out, "  {key}: {other}")?,
            }
        }
    }
    Ok(())
}

pub async fn delete(
    out: &mut dyn Write,
    store: Arc<dyn DocumentStore>,
    collection: &str,
    confirm: bool,
) -> anyhow::Result<()> {
    if !confirm {
        writeln!(out, "Are you sure you want to delete collection '{collection}'?")?;
        writeln!(out, "Add --confirm to proceed")?;
        return Ok(());
    }

    store.delete_collection(collection).await?;
    tracing::info!(collection, "collection deleted");
    writeln!(out, "Deleted collection: {collection}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chlix_index::ChunkerConfig;
    use chlix_store::{InMemoryDocumentStore, MockEmbedder};

    use super::*;

    fn memory_store() -> Arc<dyn DocumentStore> {
        Arc::new(InMemoryDocumentStore::new(MockEmbedder::default()))
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    async fn indexed_store() -> (tempfile::TempDir, Arc<dyn DocumentStore>) {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("demo-repo");
        std::fs::create_dir_all(repo.join("src")).unwrap();
        std::fs::write(repo.join("src/auth.py"), "def login(user, password):\n    return check(password)\n").unwrap();
        std::fs::write(repo.join("src/math.rs"), "fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n").unwrap();

        let store = memory_store();
        let mut out = Vec::new();
        index(&mut out, Arc::clone(&store), &repo, None, IndexerConfig::default())
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn index_derives_collection_and_prints_summary() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("my-project");
        std::fs::create_dir(&repo).unwrap();
        std::fs::write(repo.join("main.go"), "package main\n").unwrap();

        let store = memory_store();
        let mut out = Vec::new();
        let config = IndexerConfig {
            chunker: ChunkerConfig { chunk_size: 50 },
            ..IndexerConfig::default()
        };
        index(&mut out, Arc::clone(&store), &repo, None, config).await.unwrap();

        let text = output(out);
        assert!(text.contains("Collection: my-project"));
        assert!(text.contains("Total Chunks: 1"));
        assert!(text.contains("Successfully indexed 'my-project'"));
        assert_eq!(store.count("my-project").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn index_fails_when_every_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("offline");
        std::fs::create_dir(&repo).unwrap();
        std::fs::write(repo.join("a.py"), "x = 1\n").unwrap();
        std::fs::write(repo.join("b.py"), "y = 2\n").unwrap();

        let store: Arc<dyn DocumentStore> =
            Arc::new(InMemoryDocumentStore::new(MockEmbedder::failing()));
        let mut out = Vec::new();
        let err = index(&mut out, store, &repo, None, IndexerConfig::default())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no files were indexed"));
        let text = output(out);
        assert!(text.contains("Failed 2 files:"));
        assert!(!text.contains("Successfully indexed"));
    }

    #[tokio::test]
    async fn index_rejects_missing_path() {
        let mut out = Vec::new();
        let err = index(
            &mut out,
            memory_store(),
            Path::new("/no/such/repo"),
            None,
            IndexerConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("path does not exist"));
    }

    #[tokio::test]
    async fn search_prints_numbered_results() {
        let (_dir, store) = indexed_store().await;
        let mut out = Vec::new();
        search(&mut out, store, "demo-repo", "login password", 1, None).await.unwrap();

        let text = output(out);
        assert!(text.starts_with("Found 1 results for: login password"));
        assert!(text.contains("Result 1: src/auth.py"));
        assert!(text.contains("Lines 1-2"));
        assert!(text.contains("Relevance: "));
    }

    #[tokio::test]
    async fn search_without_hits_says_so() {
        let store = memory_store();
        store.get_or_create_collection("empty").await.unwrap();
        let mut out = Vec::new();
        search(&mut out, store, "empty", "anything", 5, None).await.unwrap();
        assert_eq!(output(out), "No results found for: anything\n");
    }

    #[tokio::test]
    async fn search_type_filter_accepts_bare_extension() {
        let (_dir, store) = indexed_store().await;
        let mut out = Vec::new();
        search(&mut out, store, "demo-repo", "login", 5, Some("rs")).await.unwrap();
        let text = output(out);
        assert!(text.contains("src/math.rs"));
        assert!(!text.contains("src/auth.py"));
    }

    #[tokio::test]
    async fn context_prints_window() {
        let (_dir, store) = indexed_store().await;
        let mut out = Vec::new();
        context(&mut out, store, "demo-repo", "add numbers", 5, 4000).await.unwrap();
        let text = output(out);
        assert!(text.starts_with("# Relevant Code Context\n\n## File: "));
        assert!(text.contains("## File: src/math.rs (Lines 1-3)\nrs\n"));
    }

    #[tokio::test]
    async fn file_prints_chunks_in_order() {
        let (_dir, store) = indexed_store().await;
        let mut out = Vec::new();
        file(&mut out, store, "demo-repo", "src/math.rs").await.unwrap();
        let text = output(out);
        assert!(text.starts_with("src/math.rs (1 chunks)"));
        assert!(text.contains("--- Lines 1-3 ---"));
    }

    #[tokio::test]
    async fn list_empty_shows_hint() {
        let mut out = Vec::new();
        list(&mut out, memory_store()).await.unwrap();
        assert!(output(out).contains("chlix index"));
    }

    #[tokio::test]
    async fn list_and_info_show_counts() {
        let (_dir, store) = indexed_store().await;

        let mut out = Vec::new();
        list(&mut out, Arc::clone(&store)).await.unwrap();
        assert!(output(out).contains("  - demo-repo (2 chunks)"));

        let mut out = Vec::new();
        info(&mut out, store, "demo-repo").await.unwrap();
        let text = output(out);
        assert!(text.contains("Total chunks: 2"));
        assert!(text.contains("Sample metadata:"));
        assert!(text.contains("  start_line: 1"));
    }

    #[tokio::test]
    async fn info_missing_collection_is_not_found() {
        let mut out = Vec::new();
        let err = info(&mut out, memory_store(), "ghost").await.unwrap_err();
        assert!(
            err.downcast_ref::<chlix_store::StoreError>()
                .is_some_and(chlix_store::StoreError::is_not_found)
        );
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let (_dir, store) = indexed_store().await;

        let mut out = Vec::new();
        delete(&mut out, Arc::clone(&store), "demo-repo", false).await.unwrap();
        assert!(output(out).contains("Add --confirm to proceed"));
        assert_eq!(store.count("demo-repo").await.unwrap(), 2);

        let mut out = Vec::new();
        delete(&mut out, Arc::clone(&store), "demo-repo", true).await.unwrap();
        assert_eq!(output(out), "Deleted collection: demo-repo\n");
        assert!(store.count("demo-repo").await.unwrap_err().is_not_found());
    }

    #[test]
    fn file_type_normalization() {
        assert_eq!(normalize_file_type("rs"), ".rs");
        assert_eq!(normalize_file_type(".py"), ".py");
    }
}
