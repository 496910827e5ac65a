//! Greedy token-budget packing.
//!
//! Units accumulate into a chunk while the running token count stays within
//! `chunk_size`. On overflow the chunk flushes and, when `overlap > 0`, the
//! next chunk is seeded with the whole previous unit, so overlap size varies
//! with unit length. A single unit larger than the budget is emitted alone
//! rather than split.

use super::tokenizer::TokenCounter;

/// Pack ordered units into chunk texts. Units within a chunk are joined with
/// a single space; token counts are computed once per unit.
pub fn pack_units(
    units: &[String],
    counter: &dyn TokenCounter,
    chunk_size: usize,
    overlap: usize,
) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut cur_texts: Vec<&str> = Vec::new();
    let mut cur_counts: Vec<usize> = Vec::new();
    let mut cur_total = 0usize;

    fn flush(chunks: &mut Vec<String>, cur_texts: &[&str]) {
        if cur_texts.is_empty() {
            return;
        }
        let text = cur_texts.join(" ").trim().to_string();
        if !text.is_empty() {
            chunks.push(text);
        }
    }

    for unit in units {
        let count = counter.count(unit);
        if cur_total + count <= chunk_size {
            cur_texts.push(unit);
            cur_counts.push(count);
            cur_total += count;
        } else {
            flush(&mut chunks, &cur_texts);
            if overlap > 0 && !cur_texts.is_empty() {
                let carried = cur_texts[cur_texts.len() - 1];
                let carried_count = cur_counts[cur_counts.len() - 1];
                cur_texts = vec![carried];
                cur_counts = vec![carried_count];
                cur_total = carried_count;
            } else {
                cur_texts.clear();
                cur_counts.clear();
                cur_total = 0;
            }
            cur_texts.push(unit);
            cur_counts.push(count);
            cur_total += count;
        }
    }

    flush(&mut chunks, &cur_texts);
    chunks
}
