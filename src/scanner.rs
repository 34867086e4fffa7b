//! String-literal-aware scanning primitives
//!
//! Every structural decision in the chunker goes through these functions:
//! they locate boundaries (matching parentheses, top-level semicolons,
//! top-level keywords) without being fooled by quoted literal content.
//! All scanners are total: malformed input (unbalanced parentheses, an
//! unterminated literal) degrades to "not found" rather than an error,
//! because the chunker always has a single-fragment fallback.
//!
//! Offsets are byte offsets into the input. The characters that matter
//! structurally (quotes, parentheses, semicolons, keyword letters) are all
//! ASCII, so byte-wise scanning never splits a multi-byte character at a
//! boundary we report.

/// Tracks whether the scan position is inside a quoted literal.
///
/// The quote character that opened the literal is the only one that can
/// close it, and a quote preceded by a backslash does not terminate it.
#[derive(Debug, Default, Clone, Copy)]
struct LiteralState {
    quote: Option<u8>,
}

impl LiteralState {
    /// Feed one byte; returns true when the byte was a structural quote
    /// (opened or closed a literal).
    fn step(&mut self, bytes: &[u8], i: usize) -> bool {
        let c = bytes[i];
        if (c == b'\'' || c == b'"') && (i == 0 || bytes[i - 1] != b'\\') {
            match self.quote {
                None => {
                    self.quote = Some(c);
                    return true;
                }
                Some(q) if q == c => {
                    self.quote = None;
                    return true;
                }
                Some(_) => {}
            }
        }
        false
    }

    fn in_literal(&self) -> bool {
        self.quote.is_some()
    }
}

/// Find the `)` matching the `(` at byte offset `open`.
///
/// Single pass, O(n). Returns `None` when `open` does not point at a `(`
/// or the parentheses are unbalanced.
pub fn find_matching_paren(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }

    let mut depth: i32 = 0;
    let mut literal = LiteralState::default();

    for i in open..bytes.len() {
        if literal.step(bytes, i) || literal.in_literal() {
            continue;
        }
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on `;` outside string literals. Segments are trimmed and empty
/// segments dropped; the semicolons themselves are not part of any segment.
pub fn split_on_semicolons(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut literal = LiteralState::default();

    for i in 0..bytes.len() {
        if literal.step(bytes, i) || literal.in_literal() {
            continue;
        }
        if bytes[i] == b';' {
            let segment = text[start..i].trim();
            if !segment.is_empty() {
                segments.push(segment);
            }
            start = i + 1;
        }
    }

    let last = text[start..].trim();
    if !last.is_empty() {
        segments.push(last);
    }
    segments
}

/// Return a copy with string literal contents blanked out (quotes kept,
/// inner characters replaced by spaces). Only ever used for boundary
/// detection; the emitted SQL always comes from the original text.
pub fn mask_string_literals(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut masked = String::with_capacity(text.len());
    let mut literal = LiteralState::default();

    for (i, ch) in text.char_indices() {
        if literal.step(bytes, i) {
            masked.push(ch);
        } else if literal.in_literal() {
            masked.push(' ');
        } else {
            masked.push(ch);
        }
    }
    masked
}

/// Return a copy with every top-level parenthesized span collapsed to the
/// two-character placeholder `()` and string literal contents dropped.
/// Used to test for keywords that must only count at the top level
/// (a UNION inside a subquery must not trigger a UNION split).
pub fn mask_parenthesized(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut masked = String::with_capacity(text.len());
    let mut depth: i32 = 0;
    let mut literal = LiteralState::default();

    for (i, ch) in text.char_indices() {
        if literal.step(bytes, i) {
            if depth == 0 {
                masked.push(ch);
            }
            continue;
        }
        if literal.in_literal() {
            continue;
        }
        match ch {
            '(' => {
                depth += 1;
                if depth == 1 {
                    masked.push_str("()");
                }
            }
            ')' => depth = (depth - 1).max(0),
            _ => {
                if depth == 0 {
                    masked.push(ch);
                }
            }
        }
    }
    masked
}

/// A keyword occurrence found at nesting depth 0, outside any literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSpan<'a> {
    /// Byte offset of the keyword's first character.
    pub start: usize,
    /// Byte offset just past the keyword's last character.
    pub end: usize,
    /// The keyword as given in the search list (not as spelled in the text).
    pub keyword: &'a str,
}

/// Find case-insensitive occurrences of any of `keywords` at paren depth 0,
/// outside string literals, bounded by non-identifier characters on both
/// sides. Keywords are tried in the order given, so a longer variant
/// (`UNION ALL`) must precede its prefix (`UNION`).
pub fn find_top_level_keywords<'a>(text: &str, keywords: &[&'a str]) -> Vec<KeywordSpan<'a>> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut depth: i32 = 0;
    let mut literal = LiteralState::default();
    let mut i = 0;

    while i < bytes.len() {
        if literal.step(bytes, i) || literal.in_literal() {
            i += 1;
            continue;
        }
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth = (depth - 1).max(0),
            _ if depth == 0 => {
                if let Some(keyword) = match_keyword_at(text, i, keywords) {
                    spans.push(KeywordSpan {
                        start: i,
                        end: i + keyword.len(),
                        keyword,
                    });
                    i += keyword.len();
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }
    spans
}

/// Check whether one of `keywords` starts at byte offset `i` with
/// identifier boundaries on both sides.
fn match_keyword_at<'a>(text: &str, i: usize, keywords: &[&'a str]) -> Option<&'a str> {
    let bytes = text.as_bytes();
    if i > 0 && is_ident_byte(bytes[i - 1]) {
        return None;
    }
    for &keyword in keywords {
        let end = i + keyword.len();
        if end > bytes.len() {
            continue;
        }
        if !bytes[i..end].eq_ignore_ascii_case(keyword.as_bytes()) {
            continue;
        }
        if end < bytes.len() && is_ident_byte(bytes[end]) {
            continue;
        }
        return Some(keyword);
    }
    None
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
