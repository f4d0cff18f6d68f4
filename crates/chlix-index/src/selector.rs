//! File eligibility: excluded directories and the extension allow-list.

use std::path::{Component, Path};

/// Directory names never descended into or indexed from.
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "venv",
    "coverage",
    ".pytest_cache",
    "chroma_db",
    "target",
];

/// Extensions (with leading dot) of files worth indexing.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    ".py", ".ts", ".js", ".tsx", ".jsx", ".mjs", ".cjs", ".vue", ".svelte", ".css", ".scss",
    ".sass", ".less", ".html", ".htm", ".md", ".txt", ".feature", ".yml", ".yaml", ".json",
    ".sh", ".bash", ".tf", ".tfvars", ".sql", ".graphql", ".gql", ".rs", ".go", ".java", ".kt",
    ".kts", ".rb", ".php", ".ex", ".exs", ".cs", ".vb", ".fs", ".fsi",
];

/// Multi-dot suffixes matched against the whole file name.
pub const ALLOWED_COMPOUND_SUFFIXES: &[&str] = &[".env.example", ".env.sample"];

/// Whether a single directory name is on the exclusion list.
#[must_use]
pub fn is_excluded_dir(name: &str) -> bool {
    EXCLUDED_DIRS.contains(&name)
}

/// Whether any component of `path` is an excluded directory name.
#[must_use]
pub fn has_excluded_component(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => name.to_str().is_some_and(is_excluded_dir),
        _ => false,
    })
}

/// The type tag for `path`: its allowed suffix including the leading dot.
///
/// Compound suffixes win over the plain extension. Matching is case-sensitive.
#[must_use]
pub fn file_type(path: &Path) -> Option<&'static str> {
    let name = path.file_name()?.to_str()?;
    if let Some(suffix) = ALLOWED_COMPOUND_SUFFIXES
        .iter()
        .copied()
        .find(|s| name.ends_with(s))
    {
        return Some(suffix);
    }
    let ext = path.extension()?.to_str()?;
    ALLOWED_EXTENSIONS
        .iter()
        .copied()
        .find(|allowed| allowed.strip_prefix('.') == Some(ext))
}

/// Check whether a file should be indexed.
///
/// `path` should be relative to the indexing root so that directories above
/// the root never disqualify it. Content is not inspected.
#[must_use]
pub fn is_indexable(path: &Path) -> bool {
    !has_excluded_component(path) && file_type(path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_extension_accepted() {
        assert!(is_indexable(Path::new("src/main.rs")));
        assert!(is_indexable(Path::new("app/views/index.html")));
        assert!(is_indexable(Path::new("README.md")));
    }

    #[test]
    fn unknown_extension_rejected() {
        assert!(!is_indexable(Path::new("image.png")));
        assert!(!is_indexable(Path::new("Makefile")));
        assert!(!is_indexable(Path::new("Cargo.lock")));
    }

    #[test]
    fn extension_match_is_case_sensitive() {
        assert!(!is_indexable(Path::new("MAIN.RS")));
    }

    #[test]
    fn excluded_directory_at_any_depth() {
        assert!(!is_indexable(Path::new("node_modules/lodash/index.js")));
        assert!(!is_indexable(Path::new("packages/web/node_modules/x/y.ts")));
        assert!(!is_indexable(Path::new("a/b/c/__pycache__/m.py")));
        assert!(!is_indexable(Path::new(".git/hooks/pre-commit.sh")));
    }

    #[test]
    fn excluded_name_only_matches_whole_component() {
        assert!(is_indexable(Path::new("src/builder/mod.rs")));
        assert!(is_indexable(Path::new("docs/build.md")));
    }

    #[test]
    fn hidden_non_excluded_dirs_allowed() {
        assert!(is_indexable(Path::new(".github/workflows/ci.yml")));
    }

    #[test]
    fn compound_suffix() {
        assert_eq!(file_type(Path::new(".env.example")), Some(".env.example"));
        assert_eq!(file_type(Path::new("conf/app.env.sample")), Some(".env.sample"));
        assert!(is_indexable(Path::new("deploy/.env.example")));
        assert!(!is_indexable(Path::new(".env")));
    }

    #[test]
    fn file_type_includes_dot() {
        assert_eq!(file_type(Path::new("lib.rs")), Some(".rs"));
        assert_eq!(file_type(Path::new("a/b.test.tsx")), Some(".tsx"));
        assert_eq!(file_type(Path::new("noext")), None);
    }

    #[test]
    fn excluded_dir_lookup() {
        assert!(is_excluded_dir("target"));
        assert!(is_excluded_dir(".venv"));
        assert!(!is_excluded_dir("src"));
    }
}
