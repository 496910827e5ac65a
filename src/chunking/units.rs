//! Splitting section bodies into packable units.
//!
//! Paragraphs split on blank lines. A paragraph containing list markers
//! contributes one unit per non-empty line; prose paragraphs split on
//! sentence boundaries, with sub-40-char sentences merged forward so tiny
//! fragments never become units of their own. Paragraphs without any
//! uppercase letter (where the boundary heuristic has nothing to key on)
//! fall back to a plain punctuation split with no merging.

use std::sync::LazyLock;

use regex::Regex;

static LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(\s*[-*+]\s+|\s*\d+\.\s+)").unwrap());

/// Units shorter than this merge into the following sentence.
const MIN_UNIT_CHARS: usize = 40;

/// Split one section body into ordered units.
pub fn split_units(section_text: &str) -> Vec<String> {
    let mut units = Vec::new();
    for para in section_text.split("\n\n") {
        let p = para.trim();
        if p.is_empty() {
            continue;
        }
        if LIST_RE.is_match(p) {
            for line in p.lines() {
                let line = line.trim();
                if !line.is_empty() {
                    units.push(line.to_string());
                }
            }
        } else {
            units.extend(split_sentences(p));
        }
    }
    units
}

/// Split a prose paragraph into sentence units.
pub fn split_sentences(block: &str) -> Vec<String> {
    let block = block.trim();
    if block.is_empty() {
        return Vec::new();
    }
    if !block.chars().any(char::is_uppercase) {
        return split_uncased(block);
    }
    merge_short(split_cased(block))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Sentence-boundary scan for cased text.
///
/// A boundary is a whitespace run preceded by `.`/`!`/`?` and followed by an
/// uppercase letter — unless the period closes a single-letter abbreviation
/// ("U.S.", "J. Smith"), detected as an uppercase letter at a word boundary
/// immediately before the period.
fn split_cased(block: &str) -> Vec<String> {
    let chars: Vec<char> = block.chars().collect();
    let mut parts = Vec::new();
    let mut part_start = 0;
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_whitespace() && i > 0 && matches!(chars[i - 1], '.' | '!' | '?') {
            let mut j = i;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            let next_is_upper = j < chars.len() && chars[j].is_uppercase();
            let abbreviation = chars[i - 1] == '.'
                && i >= 2
                && chars[i - 2].is_uppercase()
                && (i == 2 || !is_word_char(chars[i - 3]));
            if next_is_upper && !abbreviation {
                parts.push(chars[part_start..i].iter().collect());
                part_start = j;
            }
            i = j;
        } else {
            i += 1;
        }
    }
    if part_start < chars.len() {
        parts.push(chars[part_start..].iter().collect());
    }
    parts
}

/// Fallback split for text with no uppercase: break after `.`/`!`/`?`/`;`
/// plus whitespace, keep everything, merge nothing.
fn split_uncased(block: &str) -> Vec<String> {
    let chars: Vec<char> = block.chars().collect();
    let mut parts = Vec::new();
    let mut part_start = 0;
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_whitespace() && i > 0 && matches!(chars[i - 1], '.' | '!' | '?' | ';') {
            let mut j = i;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            parts.push(chars[part_start..i].iter().collect());
            part_start = j;
            i = j;
        } else {
            i += 1;
        }
    }
    if part_start < chars.len() {
        parts.push(chars[part_start..].iter().collect());
    }
    parts.into_iter().filter(|p: &String| !p.is_empty()).collect()
}

/// Merge sub-[`MIN_UNIT_CHARS`] parts forward; a trailing short buffer is
/// flushed as its own unit.
fn merge_short(parts: Vec<String>) -> Vec<String> {
    let mut merged = Vec::new();
    let mut buf = String::new();
    for p in parts {
        if p.is_empty() {
            continue;
        }
        if p.chars().count() < MIN_UNIT_CHARS {
            if buf.is_empty() {
                buf = p;
            } else {
                buf = format!("{buf} {p}").trim().to_string();
            }
        } else {
            if !buf.is_empty() {
                merged.push(std::mem::take(&mut buf).trim().to_string());
            }
            merged.push(p.trim().to_string());
        }
    }
    if !buf.is_empty() {
        merged.push(buf.trim().to_string());
    }
    merged
}
