//! Markdown-aware section splitting.
//!
//! Sections run from one ATX heading to the next; the heading line itself
//! belongs to its section so downstream stages see it. Headings inside
//! fenced code blocks are ignored. Spans are byte offsets into the
//! normalized document text.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6})\s+(.+?)\s*$").unwrap());
static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```.*?```").unwrap());

/// One document section: heading metadata plus the byte span of the section
/// body (heading line included) in the normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Trimmed heading title; empty for preamble or heading-free documents.
    pub heading: String,
    /// Heading level 1–6, or 0 when there is no heading.
    pub level: u8,
    pub start: usize,
    pub end: usize,
}

impl Section {
    fn whole(text: &str) -> Self {
        Self {
            heading: String::new(),
            level: 0,
            start: 0,
            end: text.len(),
        }
    }
}

/// Split normalized text into sections.
///
/// With `markdown_aware` off, or when no heading exists outside fenced code,
/// the whole document is a single `heading="", level=0` section. Text before
/// the first heading becomes its own preamble section when non-blank.
pub fn split_sections(text: &str, markdown_aware: bool) -> Vec<Section> {
    if text.is_empty() {
        return Vec::new();
    }
    if !markdown_aware {
        return vec![Section::whole(text)];
    }

    let fences: Vec<Range<usize>> = FENCE_RE.find_iter(text).map(|m| m.range()).collect();
    let in_fence = |pos: usize| fences.iter().any(|r| r.contains(&pos));

    let heads: Vec<(usize, u8, String)> = HEADING_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if in_fence(whole.start()) {
                return None;
            }
            let level = caps.get(1)?.as_str().len() as u8;
            let heading = caps.get(2)?.as_str().trim().to_string();
            Some((whole.start(), level, heading))
        })
        .collect();

    if heads.is_empty() {
        return vec![Section::whole(text)];
    }

    let mut sections = Vec::with_capacity(heads.len() + 1);
    let first = heads[0].0;
    if !text[..first].trim().is_empty() {
        sections.push(Section {
            heading: String::new(),
            level: 0,
            start: 0,
            end: first,
        });
    }
    for (i, (start, level, heading)) in heads.iter().enumerate() {
        let end = heads.get(i + 1).map_or(text.len(), |next| next.0);
        sections.push(Section {
            heading: heading.clone(),
            level: *level,
            start: *start,
            end,
        });
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1. No headings: one section covering the whole document.
    #[test]
    fn plain_text_is_one_section() {
        let text = "Just prose.\n\nMore prose.";
        let sections = split_sections(text, true);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "");
        assert_eq!(sections[0].level, 0);
        assert_eq!((sections[0].start, sections[0].end), (0, text.len()));
    }

    // 2. Headings delimit sections; the heading line stays in its section.
    #[test]
    fn headings_delimit_sections() {
        let text = "# One\nalpha\n\n## Two\nbeta";
        let sections = split_sections(text, true);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading, "One");
        assert_eq!(sections[0].level, 1);
        assert_eq!(sections[1].heading, "Two");
        assert_eq!(sections[1].level, 2);
        assert!(text[sections[0].start..sections[0].end].contains("alpha"));
        assert!(text[sections[1].start..sections[1].end].starts_with("## Two"));
    }

    // 3. Pre-heading text survives as a level-0 preamble section.
    #[test]
    fn preamble_kept_before_first_heading() {
        let text = "intro line\n\n# Title\nbody";
        let sections = split_sections(text, true);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading, "");
        assert_eq!(sections[0].level, 0);
        assert!(text[sections[0].start..sections[0].end].contains("intro line"));
        assert_eq!(sections[1].heading, "Title");
    }

    // 4. A "#" line inside a fenced code block is not a heading.
    #[test]
    fn fenced_code_hides_headings() {
        let text = "# Real\nbefore\n```\n# not a heading\n```\nafter";
        let sections = split_sections(text, true);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "Real");
        assert_eq!((sections[0].start, sections[0].end), (0, text.len()));
    }

    // 5. Markdown awareness off: single section regardless of headings.
    #[test]
    fn markdown_aware_off() {
        let sections = split_sections("# Title\nbody", false);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "");
    }

    // 6. Spans are contiguous and non-decreasing.
    #[test]
    fn spans_are_ordered() {
        let text = "pre\n\n# A\none\n\n# B\ntwo\n\n# C\nthree";
        let sections = split_sections(text, true);
        for pair in sections.windows(2) {
            assert!(pair[0].start <= pair[1].start);
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(sections.last().unwrap().end, text.len());
    }

    // 7. Heading level capped at six hashes; seven is not a heading.
    #[test]
    fn seven_hashes_is_not_a_heading() {
        let sections = split_sections("####### deep\nbody", true);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "");
    }
}
