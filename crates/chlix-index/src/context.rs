//! Context-window text formatting and cost estimation.

/// Fixed heading at the top of every context window. Not counted against the budget.
pub const CONTEXT_PREAMBLE: &str = "# Relevant Code Context\n\n";

/// Rough token estimate: one token per four characters.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Short header for a chunk, e.g. `src/lib.rs (Lines 1-20)`.
#[must_use]
pub fn chunk_display_header(file_path: &str, start_line: usize, end_line: usize) -> String {
    format!("{file_path} (Lines {start_line}-{end_line})")
}

/// Format one result as a context block: header, bare type tag, content.
#[must_use]
pub fn format_context_block(
    file_path: &str,
    start_line: usize,
    end_line: usize,
    file_type: &str,
    content: &str,
) -> String {
    let language = file_type.trim_start_matches('.');
    let header = chunk_display_header(file_path, start_line, end_line);
    format!("## File: {header}\n{language}\n{content}\n")
}
