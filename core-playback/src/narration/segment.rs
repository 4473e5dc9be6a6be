//! Sentence segmentation for chunked narration.

/// Characters that end a sentence-sized chunk.
///
/// `|` and `।` (danda) are used as full stops in Devanagari and other Indic
/// scripts.
const TERMINALS: &[char] = &['.', '!', '?', '|', '\n', '।'];

fn is_terminal(c: char) -> bool {
    TERMINALS.contains(&c)
}

/// Split `text` into ordered, trimmed chunks.
///
/// Each chunk is a maximal run of non-terminal characters followed by the
/// run of terminals after it (or the end of input). Whitespace counts as
/// non-terminal, so `" ..."` is a chunk of its own. Chunks that trim to
/// nothing are dropped, as are terminals at the very start of the input.
/// When that leaves nothing, the whole trimmed input becomes the single
/// chunk; empty input yields no chunks.
pub fn segment(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut in_terminal_run = false;

    for c in text.chars() {
        if is_terminal(c) {
            in_terminal_run = true;
        } else if in_terminal_run {
            push_chunk(&mut chunks, &current);
            current.clear();
            in_terminal_run = false;
        }
        current.push(c);
    }
    push_chunk(&mut chunks, &current);

    if chunks.is_empty() {
        let whole = text.trim();
        if !whole.is_empty() {
            chunks.push(whole.to_string());
        }
    }

    chunks
}

fn push_chunk(chunks: &mut Vec<String>, raw: &str) {
    // Only the input's leading terminal run can start with a terminal.
    if raw.starts_with(is_terminal) {
        return;
    }
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
