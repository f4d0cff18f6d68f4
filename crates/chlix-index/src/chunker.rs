//! Greedy line-aligned chunking.
//!
//! Lines are packed into a chunk until the next line would push the chunk's
//! character count past the configured size. Lines are never split, so a line
//! longer than the limit becomes a chunk of its own.

use crate::identity::chunk_id;

/// One contiguous run of lines from a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Path relative to the indexing root, `/`-separated.
    pub file_path: String,
    /// 1-based, inclusive.
    pub start_line: usize,
    /// 1-based, inclusive.
    pub end_line: usize,
    pub file_type: String,
}

impl Chunk {
    /// Stable store identifier derived from path and line range.
    #[must_use]
    pub fn id(&self) -> String {
        chunk_id(&self.file_path, self.start_line, self.end_line)
    }
}

/// Chunker configuration.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Maximum characters per chunk, newlines excluded (default: 1000).
    pub chunk_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self { chunk_size: 1000 }
    }
}

/// Split `source` into ordered chunks covering every line exactly once.
///
/// Joining the returned texts with `\n` reproduces `source` exactly. A single
/// trailing newline ends the last line instead of starting an empty one and
/// stays attached to the last chunk's text. Empty input yields no chunks.
#[must_use]
pub fn chunk_text(
    source: &str,
    file_path: &str,
    file_type: &str,
    config: &ChunkerConfig,
) -> Vec<Chunk> {
    if source.is_empty() {
        return Vec::new();
    }

    let (body, trailing_newline) = match source.strip_suffix('\n') {
        Some(body) => (body, true),
        None => (source, false),
    };

    let mut chunks = Vec::new();
    let mut batch: Vec<&str> = Vec::new();
    let mut batch_size: usize = 0;
    let mut start_line: usize = 1;

    for (idx, line) in body.split('\n').enumerate() {
        let line_no = idx + 1;
        let line_size = line.chars().count();

        if batch_size + line_size > config.chunk_size && !batch.is_empty() {
            chunks.push(make_chunk(&batch, file_path, file_type, start_line));
            batch.clear();
            batch_size = 0;
            start_line = line_no;
        }

        batch.push(line);
        batch_size += line_size;
    }

    if !batch.is_empty() {
        chunks.push(make_chunk(&batch, file_path, file_type, start_line));
    }

    if trailing_newline && let Some(last) = chunks.last_mut() {
        last.text.push('\n');
    }

    chunks
}

fn make_chunk(lines: &[&str], file_path: &str, file_type: &str, start_line: usize) -> Chunk {
    Chunk {
        text: lines.join("\n"),
        file_path: file_path.to_string(),
        start_line,
        end_line: start_line + lines.len() - 1,
        file_type: file_type.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn chunk(source: &str, size: usize) -> Vec<Chunk> {
        chunk_text(source, "src/lib.rs", ".rs", &ChunkerConfig { chunk_size: size })
    }

    fn ranges(chunks: &[Chunk]) -> Vec<(usize, usize)> {
        chunks.iter().map(|c| (c.start_line, c.end_line)).collect()
    }

    #[test]
    fn default_size_is_1000() {
        assert_eq!(ChunkerConfig::default().chunk_size, 1000);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk("", 10).is_empty());
    }

    #[test]
    fn one_line_per_chunk_at_size_one() {
        let chunks = chunk("a\nb\nc\n", 1);
        assert_eq!(chunks.len(), 3);
        assert_eq!(ranges(&chunks), vec![(1, 1), (2, 2), (3, 3)]);
        assert_eq!(chunks[0].text, "a");
        assert_eq!(chunks[1].text, "b");
        assert_eq!(chunks[2].text, "c\n");
    }

    #[test]
    fn small_file_is_one_chunk() {
        let source = "fn main() {\n    println!(\"hi\");\n}\n";
        let chunks = chunk(source, 1000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, source);
        assert_eq!(ranges(&chunks), vec![(1, 3)]);
        assert_eq!(chunks[0].file_path, "src/lib.rs");
        assert_eq!(chunks[0].file_type, ".rs");
    }

    #[test]
    fn oversized_line_is_its_own_chunk() {
        let long = "x".repeat(50);
        let source = format!("ab\n{long}\ncd");
        let chunks = chunk(&source, 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].text, long);
        assert_eq!(ranges(&chunks), vec![(1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn single_oversized_line_without_newline() {
        let long = "y".repeat(5000);
        let chunks = chunk(&long, 1000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, long);
        assert_eq!(ranges(&chunks), vec![(1, 1)]);
    }

    #[test]
    fn line_exactly_at_threshold_starts_new_chunk_when_buffer_has_content() {
        let chunks = chunk("ab\ncdef", 4);
        assert_eq!(ranges(&chunks), vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn line_exactly_at_threshold_fits_empty_buffer() {
        let chunks = chunk("abcd\nef", 4);
        assert_eq!(ranges(&chunks), vec![(1, 1), (2, 2)]);
        assert_eq!(chunks[0].text, "abcd");
    }

    #[test]
    fn lines_fill_up_to_threshold_inclusive() {
        let chunks = chunk("ab\ncd\nef", 4);
        assert_eq!(ranges(&chunks), vec![(1, 2), (3, 3)]);
        assert_eq!(chunks[0].text, "ab\ncd");
    }

    #[test]
    fn size_counts_characters_not_bytes() {
        let chunks = chunk("привет\nмир", 9);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn blank_lines_are_preserved() {
        let source = "a\n\n\nb\n";
        let chunks = chunk(source, 1000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, source);
        assert_eq!(ranges(&chunks), vec![(1, 4)]);
    }

    #[test]
    fn newline_only_input() {
        let chunks = chunk("\n", 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "\n");
        assert_eq!(ranges(&chunks), vec![(1, 1)]);
    }

    #[test]
    fn crlf_kept_as_content() {
        let source = "a\r\nb\r\n";
        let chunks = chunk(source, 1000);
        assert_eq!(chunks[0].text, source);
        assert_eq!(ranges(&chunks), vec![(1, 2)]);
    }

    #[test]
    fn chunk_id_follows_range() {
        let chunks = chunk("a\nb", 1);
        assert_eq!(chunks[0].id(), chunk_id("src/lib.rs", 1, 1));
        assert_eq!(chunks[1].id(), chunk_id("src/lib.rs", 2, 2));
        assert_ne!(chunks[0].id(), chunks[1].id());
    }

    proptest! {
        #[test]
        fn joined_chunks_reconstruct_source(
            source in "[a-z \\n]{0,400}",
            size in 1usize..80,
        ) {
            let chunks = chunk(&source, size);
            let joined = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n");
            prop_assert_eq!(joined, source);
        }

        #[test]
        fn line_ranges_are_contiguous_from_one(
            source in "[a-z\\n]{1,400}",
            size in 1usize..80,
        ) {
            let chunks = chunk(&source, size);
            let expected_lines = source.strip_suffix('\n').unwrap_or(&source).split('\n').count();
            prop_assert!(!chunks.is_empty());
            prop_assert_eq!(chunks[0].start_line, 1);
            for pair in chunks.windows(2) {
                prop_assert_eq!(pair[1].start_line, pair[0].end_line + 1);
            }
            for c in &chunks {
                prop_assert!(c.start_line <= c.end_line);
            }
            prop_assert_eq!(chunks[chunks.len() - 1].end_line, expected_lines);
        }

        #[test]
        fn multi_line_chunks_respect_size(
            source in "[a-z\\n]{1,400}",
            size in 1usize..80,
        ) {
            for c in chunk(&source, size) {
                if c.start_line < c.end_line {
                    let chars = c.text.split('\n').map(|l| l.chars().count()).sum::<usize>();
                    prop_assert!(chars <= size);
                }
            }
        }
    }
}
