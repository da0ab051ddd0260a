//! Text chunking for ingestion.
//!
//! Long content is split into overlapping, size-bounded windows. Cuts
//! prefer the last whitespace in the back half of the window so words are
//! not split mid-token. Catalog-style content can instead be split on an
//! explicit record delimiter.

use tracing::warn;

/// Split `text` into chunks of at most `max_chars` characters, consecutive
/// chunks sharing `overlap` characters of context.
///
/// Text that already fits in one window is returned unchanged as a single
/// chunk. Empty or whitespace-only input yields no chunks.
pub fn chunk(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    if text.trim().is_empty() || max_chars == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let end = (start + max_chars).min(chars.len());
        let mut cut = end;

        if end < chars.len() {
            // Scan the back half of the window for the last whitespace.
            let floor = start + max_chars / 2;
            if let Some(ws) = (floor..end).rev().find(|&i| chars[i].is_whitespace()) {
                cut = ws;
            }
        }

        let piece: String = chars[start..cut].iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        if cut >= chars.len() {
            break;
        }
        // Step back by the overlap so neighbors share context, while always
        // making forward progress.
        start = cut.saturating_sub(overlap).max(start + 1);
    }

    chunks
}

/// Split strictly on a literal delimiter, trimming each record.
///
/// A record longer than `max_chars` is truncated with a warning rather than
/// split further, since splitting would break record coherence.
pub fn chunk_by_delimiter(text: &str, delimiter: &str, max_chars: usize) -> Vec<String> {
    text.split(delimiter)
        .map(str::trim)
        .filter(|record| !record.is_empty())
        .map(|record| {
            let len = record.chars().count();
            if len > max_chars {
                warn!(record_chars = len, max_chars, "record exceeds chunk size, truncating");
                record.chars().take(max_chars).collect()
            } else {
                record.to_string()
            }
        })
        .collect()
}
