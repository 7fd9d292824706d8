//! Sentence-aligned text chunker
//!
//! Splits a corpus snapshot into bounded-size chunks that never cut a
//! sentence in half. Chunks are the retrieval unit fed to the embedder.

/// Split `text` into chunks of at most `max_chunk_chars` characters.
///
/// Sentences end at `.`, `?` or `!` followed by whitespace. Sentences are
/// accumulated greedily; when the next sentence would push the chunk past the
/// limit, the current chunk is closed (trimmed) and a new one starts. A
/// single sentence longer than the limit is kept whole in its own chunk
/// rather than truncated or recursively split.
///
/// Lengths are counted in characters, not bytes. Empty or whitespace-only
/// input yields no chunks. Deterministic and side-effect free.
pub fn split(text: &str, max_chunk_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for sentence in split_sentences(text) {
        let sentence_chars = sentence.chars().count();
        // One char for the joining space when the chunk already has content
        let separator = if current.is_empty() { 0 } else { 1 };

        if current_chars + separator + sentence_chars <= max_chunk_chars {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
            current_chars += separator + sentence_chars;
        } else {
            push_chunk(&mut chunks, &current);
            current = sentence.to_string();
            current_chars = sentence_chars;
        }
    }

    push_chunk(&mut chunks, &current);
    chunks
}

fn push_chunk(chunks: &mut Vec<String>, chunk: &str) {
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Split text at terminal punctuation followed by whitespace.
///
/// The separating whitespace run is consumed; trailing text without terminal
/// punctuation still counts as a final sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '?' | '!') {
            continue;
        }
        match chars.peek() {
            Some(&(_, next)) if next.is_whitespace() => {
                sentences.push(&text[start..i + c.len_utf8()]);
                while let Some(&(_, w)) = chars.peek() {
                    if w.is_whitespace() {
                        chars.next();
                    } else {
                        break;
                    }
                }
                start = chars.peek().map(|&(j, _)| j).unwrap_or(text.len());
            }
            _ => {}
        }
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}
