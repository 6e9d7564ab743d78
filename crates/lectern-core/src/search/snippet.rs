//! Summary and key-point extraction around query matches.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static PUNCT_SPACING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*([.,;:!?])\s*").expect("valid regex"));
static BULLET_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[•●○-]\s*([^•●○\n]{20,150})").expect("valid regex"));
static SENTENCE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid regex"));

const SUMMARY_MAX_CHARS: usize = 300;
const POINT_MAX_CHARS: usize = 200;
const MAX_POINTS: usize = 5;
const MAX_WINDOWS: usize = 5;
const MAX_BULLETS_PER_WINDOW: usize = 3;

/// Preview of one document for one query.
#[derive(Debug, Clone)]
pub struct Snippet {
    pub summary: String,
    pub points: Vec<String>,
}

/// Builds a summary and up to five key points centered on query matches.
///
/// Query words of three or more characters match case-insensitively as
/// word prefixes, so "learn" also hits "learning". Matches anchor up to
/// five non-overlapping context windows, each widened to the nearest
/// sentence boundary on both sides. The first window becomes the
/// summary; points come from bullet segments inside the windows, or
/// failing that from sentences that mention a query word. Every match
/// in the emitted text is wrapped in `**` emphasis markers.
///
/// Without a usable query word or a match, the summary falls back to
/// the leading slice of the document and no points are produced.
pub fn extract(text: &str, query: &str, window: usize) -> Snippet {
    let words = query_words(query);
    let Some(matcher) = build_match_regex(&words) else {
        return fallback_snippet(text, window);
    };

    let mut windows: Vec<(usize, usize)> = Vec::new();
    for m in matcher.find_iter(text) {
        if windows.len() >= MAX_WINDOWS {
            break;
        }
        if windows.iter().any(|&(s, e)| !(m.end() < s || m.start() > e)) {
            continue;
        }
        windows.push(window_bounds(text, m.start(), m.end(), window));
    }
    if windows.is_empty() {
        return fallback_snippet(text, window);
    }

    let summary = truncate_chars(
        &clean_text(&text[windows[0].0..windows[0].1]),
        SUMMARY_MAX_CHARS,
    );

    let mut points: Vec<String> = Vec::new();
    for &(start, end) in &windows {
        collect_points(&text[start..end], &words, &mut points);
    }
    points.truncate(MAX_POINTS);

    Snippet {
        summary: highlight(&matcher, &summary),
        points: points.iter().map(|p| highlight(&matcher, p)).collect(),
    }
}

fn query_words(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

fn build_match_regex(words: &[String]) -> Option<Regex> {
    if words.is_empty() {
        return None;
    }
    let escaped: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    Regex::new(&format!(r"(?i)\b(?:{})\w*", escaped.join("|"))).ok()
}

/// Context window around one match, widened outward to the nearest
/// sentence-terminating character on each side.
///
/// The widening scans bytes, which is safe for UTF-8 text because the
/// terminators are ASCII and ASCII byte values never occur inside a
/// multi-byte sequence. The terminator itself stays outside the window.
fn window_bounds(text: &str, match_start: usize, match_end: usize, window: usize) -> (usize, usize) {
    let bytes = text.as_bytes();

    let mut start = match_start.saturating_sub(window);
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    while start > 0 && !is_sentence_terminator(bytes[start]) {
        start -= 1;
    }
    if start > 0 {
        start += 1;
    }

    let mut end = match_end.saturating_add(window).min(text.len());
    while !text.is_char_boundary(end) {
        end += 1;
    }
    while end < bytes.len() && !is_sentence_terminator(bytes[end]) {
        end += 1;
    }

    (start, end)
}

fn is_sentence_terminator(byte: u8) -> bool {
    matches!(byte, b'.' | b'!' | b'?' | b'\n')
}

/// Appends points found in one window: bullet segments when present,
/// otherwise sentences that mention a query word.
fn collect_points(window_text: &str, query_words: &[String], points: &mut Vec<String>) {
    let bullets: Vec<String> = BULLET_SEGMENT
        .captures_iter(window_text)
        .take(MAX_BULLETS_PER_WINDOW)
        .filter_map(|c| c.get(1))
        .map(|m| clean_text(m.as_str()))
        .collect();

    if !bullets.is_empty() {
        for bullet in bullets {
            if bullet.chars().count() <= 15 {
                continue;
            }
            let point = truncate_chars(&bullet, POINT_MAX_CHARS);
            if !points.contains(&point) {
                points.push(point);
            }
        }
    } else if points.len() < MAX_POINTS {
        let cleaned = clean_text(window_text);
        for sentence in SENTENCE_SPLIT.split(&cleaned) {
            let lower = sentence.to_lowercase();
            if sentence.chars().count() > 20 && query_words.iter().any(|w| lower.contains(w.as_str())) {
                let point = truncate_chars(sentence, POINT_MAX_CHARS);
                if !points.contains(&point) {
                    points.push(point);
                }
            }
        }
    }
}

fn clean_text(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text.trim(), " ");
    PUNCT_SPACING
        .replace_all(&collapsed, "$1 ")
        .trim()
        .to_string()
}

/// First `max_chars` characters, with an ellipsis only when text was cut.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

fn fallback_snippet(text: &str, window: usize) -> Snippet {
    let span = window.saturating_mul(2);
    let (leading, clipped) = match text.char_indices().nth(span) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    };
    let mut summary = truncate_chars(&clean_text(leading), SUMMARY_MAX_CHARS);
    if clipped && !summary.ends_with("...") {
        summary.push_str("...");
    }
    Snippet {
        summary,
        points: Vec::new(),
    }
}

fn highlight(matcher: &Regex, text: &str) -> String {
    matcher.replace_all(text, "**$0**").into_owned()
}
