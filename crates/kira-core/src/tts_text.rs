//! Cleanup applied to each segment before it is handed to the synthesizer.
//!
//! Display text is left untouched; only the spoken copy is rewritten. The
//! rewrite removes markup that breaks speech flow and expands legal
//! abbreviations the synthesizer would otherwise mispronounce.

use once_cell::sync::Lazy;
use regex::Regex;

static CODE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap());
static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").unwrap());
static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*#_`]").unwrap());
static BARE_SEC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bSec\s+(\d+)").unwrap());
static HORIZONTAL_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

/// Abbreviation expansions, applied with word boundaries. Initialisms are
/// spelled out with dashes so the synthesizer reads letters, not a word.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("Sec.", "Section"),
    ("Art.", "Article"),
    ("v.", "versus"),
    ("vs", "versus"),
    ("Hon'ble", "Honorable"),
    ("SC", "Supreme Court"),
    ("HC", "High Court"),
    ("IPC", "I-P-C"),
    ("CrPC", "Cr-P-C"),
    ("BNSS", "B-N-S-S"),
    ("BNS", "B-N-S"),
    ("FIR", "F-I-R"),
];

static ABBREVIATION_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    ABBREVIATIONS
        .iter()
        .map(|(abbr, full)| (word_bounded(abbr), *full))
        .collect()
});

/// `\b` only anchors against word characters, so it is applied per edge:
/// `Sec.` must not demand a boundary after the dot.
fn word_bounded(abbr: &str) -> Regex {
    let mut pattern = String::new();
    if abbr.starts_with(|c: char| c.is_alphanumeric()) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(abbr));
    if abbr.ends_with(|c: char| c.is_alphanumeric()) {
        pattern.push_str(r"\b");
    }
    Regex::new(&pattern).expect("abbreviation pattern")
}

/// Rewrites `text` into clean speakable form.
pub fn clean_for_tts(text: &str) -> String {
    let text = CODE_BLOCK.replace_all(text, "");
    let text = LINK.replace_all(&text, "$1");
    // Residual citation brackets like [1] or [doc1.pdf] break flow.
    let text = BRACKETED.replace_all(&text, "");
    let text = MARKUP.replace_all(&text, "");

    let mut text = text.into_owned();
    for (pattern, full) in ABBREVIATION_PATTERNS.iter() {
        text = pattern.replace_all(&text, *full).into_owned();
    }
    text = BARE_SEC.replace_all(&text, "Section $1").into_owned();

    HORIZONTAL_SPACE.replace_all(&text, " ").trim().to_string()
}
