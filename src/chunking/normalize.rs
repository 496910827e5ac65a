//! Deterministic text canonicalization, the first chunking stage.
//!
//! Markup handling (entity decode, then tag removal) runs only when
//! requested; whitespace canonicalization always runs. Pure functions of
//! their input — same text in, same text out.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#x?[0-9a-fA-F]+|[a-zA-Z][a-zA-Z0-9]*);").unwrap());
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Canonicalize document text.
///
/// With `strip_markup`: decode HTML entities, then remove `<...>` tags.
/// Always: NBSP → space, CRLF/CR → LF, collapse runs of 3+ newlines to a
/// blank line, trim leading/trailing whitespace.
pub fn normalize(text: &str, strip_markup: bool) -> String {
    let mut current = Cow::Borrowed(text);
    if strip_markup {
        if let Cow::Owned(s) = decode_entities(&current) {
            current = Cow::Owned(s);
        }
        if let Cow::Owned(s) = strip_tags(&current) {
            current = Cow::Owned(s);
        }
    }
    canonicalize_whitespace(&current)
}

/// Decode named, decimal, and hex HTML entities.
///
/// Unknown entities are preserved verbatim. Returns `Cow::Borrowed` when the
/// text has no `&` at all.
fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    ENTITY_RE.replace_all(input, |caps: &regex::Captures<'_>| {
        let inner = &caps[1];
        if let Some(hex) = inner.strip_prefix("#x").or_else(|| inner.strip_prefix("#X")) {
            u32::from_str_radix(hex, 16)
                .ok()
                .and_then(char::from_u32)
                .map_or_else(|| caps[0].to_string(), |c| c.to_string())
        } else if let Some(dec) = inner.strip_prefix('#') {
            dec.parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .map_or_else(|| caps[0].to_string(), |c| c.to_string())
        } else {
            named_entity(inner).map_or_else(|| caps[0].to_string(), |c| c.to_string())
        }
    })
}

/// The HTML4 named entity set: XML basics, the Latin-1 supplement, and the
/// common punctuation names. Case-sensitive, as entity names are.
#[allow(clippy::too_many_lines)]
fn named_entity(name: &str) -> Option<char> {
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        // Latin-1 symbols
        "nbsp" => '\u{00A0}',
        "iexcl" => '\u{00A1}',
        "cent" => '\u{00A2}',
        "pound" => '\u{00A3}',
        "curren" => '\u{00A4}',
        "yen" => '\u{00A5}',
        "brvbar" => '\u{00A6}',
        "sect" => '\u{00A7}',
        "uml" => '\u{00A8}',
        "copy" => '\u{00A9}',
        "ordf" => '\u{00AA}',
        "laquo" => '\u{00AB}',
        "not" => '\u{00AC}',
        "shy" => '\u{00AD}',
        "reg" => '\u{00AE}',
        "macr" => '\u{00AF}',
        "deg" => '\u{00B0}',
        "plusmn" => '\u{00B1}',
        "sup2" => '\u{00B2}',
        "sup3" => '\u{00B3}',
        "acute" => '\u{00B4}',
        "micro" => '\u{00B5}',
        "para" => '\u{00B6}',
        "middot" => '\u{00B7}',
        "cedil" => '\u{00B8}',
        "sup1" => '\u{00B9}',
        "ordm" => '\u{00BA}',
        "raquo" => '\u{00BB}',
        "frac14" => '\u{00BC}',
        "frac12" => '\u{00BD}',
        "frac34" => '\u{00BE}',
        "iquest" => '\u{00BF}',
        "times" => '\u{00D7}',
        "divide" => '\u{00F7}',
        // Latin-1 letters
        "Agrave" => '\u{00C0}',
        "Aacute" => '\u{00C1}',
        "Acirc" => '\u{00C2}',
        "Atilde" => '\u{00C3}',
        "Auml" => '\u{00C4}',
        "Aring" => '\u{00C5}',
        "AElig" => '\u{00C6}',
        "Ccedil" => '\u{00C7}',
        "Egrave" => '\u{00C8}',
        "Eacute" => '\u{00C9}',
        "Ecirc" => '\u{00CA}',
        "Euml" => '\u{00CB}',
        "Igrave" => '\u{00CC}',
        "Iacute" => '\u{00CD}',
        "Icirc" => '\u{00CE}',
        "Iuml" => '\u{00CF}',
        "ETH" => '\u{00D0}',
        "Ntilde" => '\u{00D1}',
        "Ograve" => '\u{00D2}',
        "Oacute" => '\u{00D3}',
        "Ocirc" => '\u{00D4}',
        "Otilde" => '\u{00D5}',
        "Ouml" => '\u{00D6}',
        "Oslash" => '\u{00D8}',
        "Ugrave" => '\u{00D9}',
        "Uacute" => '\u{00DA}',
        "Ucirc" => '\u{00DB}',
        "Uuml" => '\u{00DC}',
        "Yacute" => '\u{00DD}',
        "THORN" => '\u{00DE}',
        "szlig" => '\u{00DF}',
        "agrave" => '\u{00E0}',
        "aacute" => '\u{00E1}',
        "acirc" => '\u{00E2}',
        "atilde" => '\u{00E3}',
        "auml" => '\u{00E4}',
        "aring" => '\u{00E5}',
        "aelig" => '\u{00E6}',
        "ccedil" => '\u{00E7}',
        "egrave" => '\u{00E8}',
        "eacute" => '\u{00E9}',
        "ecirc" => '\u{00EA}',
        "euml" => '\u{00EB}',
        "igrave" => '\u{00EC}',
        "iacute" => '\u{00ED}',
        "icirc" => '\u{00EE}',
        "iuml" => '\u{00EF}',
        "eth" => '\u{00F0}',
        "ntilde" => '\u{00F1}',
        "ograve" => '\u{00F2}',
        "oacute" => '\u{00F3}',
        "ocirc" => '\u{00F4}',
        "otilde" => '\u{00F5}',
        "ouml" => '\u{00F6}',
        "oslash" => '\u{00F8}',
        "ugrave" => '\u{00F9}',
        "uacute" => '\u{00FA}',
        "ucirc" => '\u{00FB}',
        "uuml" => '\u{00FC}',
        "yacute" => '\u{00FD}',
        "thorn" => '\u{00FE}',
        "yuml" => '\u{00FF}',
        // Latin Extended / punctuation
        "OElig" => '\u{0152}',
        "oelig" => '\u{0153}',
        "Scaron" => '\u{0160}',
        "scaron" => '\u{0161}',
        "Yuml" => '\u{0178}',
        "fnof" => '\u{0192}',
        "circ" => '\u{02C6}',
        "tilde" => '\u{02DC}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "sbquo" => '\u{201A}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "bdquo" => '\u{201E}',
        "dagger" => '\u{2020}',
        "Dagger" => '\u{2021}',
        "bull" => '\u{2022}',
        "hellip" => '\u{2026}',
        "permil" => '\u{2030}',
        "prime" => '\u{2032}',
        "Prime" => '\u{2033}',
        "lsaquo" => '\u{2039}',
        "rsaquo" => '\u{203A}',
        "euro" => '\u{20AC}',
        "trade" => '\u{2122}',
        _ => return None,
    })
}

/// Remove `<...>` tags, keeping their text content.
fn strip_tags(input: &str) -> Cow<'_, str> {
    if !input.contains('<') {
        return Cow::Borrowed(input);
    }
    TAG_RE.replace_all(input, "")
}

fn canonicalize_whitespace(input: &str) -> String {
    let unified = input
        .replace('\u{00A0}', " ")
        .replace("\r\n", "\n")
        .replace('\r', "\n");
    BLANK_RUN_RE.replace_all(&unified, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1. Tags removed, text kept.
    #[test]
    fn strips_tags_keeps_content() {
        assert_eq!(normalize("<p>Hello <b>world</b></p>", true), "Hello world");
    }

    // 2. Markup untouched when stripping is off.
    #[test]
    fn markup_preserved_when_disabled() {
        assert_eq!(normalize("<p>Hello</p>", false), "<p>Hello</p>");
    }

    // 3. Named, decimal, and hex entities all decode.
    #[test]
    fn named_entities_decode() {
        assert_eq!(normalize("caf&eacute;", true), "café");
        assert_eq!(normalize("&Eacute;l&egrave;ve", true), "Élève");
        assert_eq!(normalize("stra&szlig;e &ndash; K&ouml;ln", true), "straße – Köln");
        assert_eq!(normalize("&frac12; cup", true), "½ cup");
        assert_eq!(normalize("a &amp; b", true), "a & b");
        assert_eq!(normalize("&#x69;gnore &#105;t", true), "ignore it");
    }

    // 4. NBSP becomes a plain space, including when it arrives as &nbsp;.
    #[test]
    fn nbsp_becomes_space() {
        assert_eq!(normalize("a\u{00A0}b", false), "a b");
        assert_eq!(normalize("a&nbsp;b", true), "a b");
    }

    // 5. CRLF and lone CR unify to LF.
    #[test]
    fn newlines_unify() {
        assert_eq!(normalize("a\r\nb\rc", false), "a\nb\nc");
    }

    // 6. Three or more newlines collapse to one blank line.
    #[test]
    fn blank_runs_collapse() {
        assert_eq!(normalize("a\n\n\n\n\nb", false), "a\n\nb");
        assert_eq!(normalize("a\n\nb", false), "a\n\nb");
    }

    // 7. Leading/trailing whitespace trimmed.
    #[test]
    fn trims_edges() {
        assert_eq!(normalize("  \n hello \n\n", false), "hello");
    }

    // 8. Normalizing twice is a no-op on markup-free text.
    #[test]
    fn idempotent_on_plain_text() {
        let once = normalize("Plain text.\n\nSecond paragraph.", true);
        assert_eq!(normalize(&once, true), once);
    }

    #[test]
    fn unknown_entities_preserved() {
        assert!(matches!(decode_entities("&foobar;"), Cow::Owned(s) if s == "&foobar;"));
        assert!(matches!(decode_entities("no entities"), Cow::Borrowed(_)));
    }
}
